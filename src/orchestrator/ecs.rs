// ABOUTME: ECS JSON 1.1 protocol client over HTTP/1.1, plain or TLS.
// ABOUTME: Implements the orchestrator capability traits with one signed request per connection.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use super::error::{
    DecodeSnafu, EncodeSnafu, QueryError, SigningSnafu, TransportError, TransportSnafu,
};
use super::signing::RequestSigner;
use super::wire::{
    ContainerOverride, DescribeServicesRequest, DescribeServicesResponse,
    DescribeTaskDefinitionRequest, DescribeTasksRequest, ErrorBody, ListTasksRequest,
    ListTasksResponse, MAX_TASKS_PER_PAGE, RunTaskRequest, TaskDefinitionResponse, TaskOverride,
    TasksResponse, UpdateServiceRequest, UpdateServiceResponse,
};
use super::{ServiceControl, SpecRegistry, TaskQueries};
use crate::types::{
    ClusterRef, RegisteredTaskSpec, ServiceRef, ServiceSnapshot, TaskId, TaskSpecId,
    TaskSpecification, TaskSummary,
};

/// `X-Amz-Target` prefix for every ECS operation.
pub const TARGET_PREFIX: &str = "AmazonEC2ContainerServiceV20141113";

const CONTENT_TYPE_JSON: &str = "application/x-amz-json-1.1";

/// Longest `startedBy` value the orchestrator accepts.
const STARTED_BY_MAX: usize = 36;

/// The public ECS endpoint for `region`.
pub fn regional_endpoint(region: &str) -> String {
    format!("https://ecs.{region}.amazonaws.com")
}

#[derive(Clone)]
struct Tls {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

/// Orchestrator client for an ECS-compatible endpoint.
///
/// `https` endpoints are verified against the Mozilla root store. Requests
/// are signed when a [`RequestSigner`] is attached and sent as-is otherwise,
/// which suits local emulators. The client holds no per-request state and is
/// safe to share between concurrent rollouts.
#[derive(Clone)]
pub struct EcsClient {
    host: String,
    port: u16,
    authority: String,
    url: String,
    tls: Option<Tls>,
    signer: Option<Arc<RequestSigner>>,
    request_timeout: Duration,
    started_by: String,
}

impl fmt::Debug for EcsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcsClient")
            .field("url", &self.url)
            .field("tls", &self.tls.is_some())
            .field("signer", &self.signer)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl EcsClient {
    /// Create a client for `endpoint` (`http://host[:port]` or `https://host[:port]`).
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, TransportError> {
        let uri: Uri = endpoint
            .parse()
            .map_err(|e| TransportError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        let (secure, default_port) = match uri.scheme_str() {
            Some("http") => (false, 80),
            Some("https") => (true, 443),
            Some(other) => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "{endpoint}: unsupported scheme {other} (use http or https)"
                )));
            }
            None => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "{endpoint}: missing scheme"
                )));
            }
        };

        let host = uri
            .host()
            .ok_or_else(|| TransportError::InvalidEndpoint(format!("{endpoint}: missing host")))?
            .to_string();
        let port = uri.port_u16().unwrap_or(default_port);
        let authority = uri
            .authority()
            .map(|a| a.to_string())
            .unwrap_or_else(|| host.clone());

        let tls = if secure {
            let server_name = ServerName::try_from(host.clone()).map_err(|e| {
                TransportError::InvalidEndpoint(format!("{endpoint}: invalid TLS server name: {e}"))
            })?;
            Some(Tls {
                connector: tls_connector()?,
                server_name,
            })
        } else {
            None
        };

        let scheme = if secure { "https" } else { "http" };
        Ok(Self {
            url: format!("{scheme}://{authority}/"),
            host,
            port,
            authority,
            tls,
            signer: None,
            request_timeout,
            started_by: started_by(),
        })
    }

    /// Sign every request with `signer`.
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    /// Issue one operation and decode its response.
    async fn call<Req, Resp>(&self, operation: &'static str, request: &Req) -> Result<Resp, QueryError>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        let body = Bytes::from(serde_json::to_vec(request).context(EncodeSnafu { operation })?);
        let mut req = self
            .request(operation, body.clone())
            .context(TransportSnafu { operation })?;

        tracing::debug!(operation, endpoint = %self.authority, signed = self.is_signed(), "orchestrator request");

        let attempt = async {
            if let Some(signer) = &self.signer {
                signer
                    .sign(&mut req, &self.url, &body)
                    .await
                    .context(SigningSnafu { operation })?;
            }
            self.send(req).await.context(TransportSnafu { operation })
        };

        let (status, bytes) = tokio::time::timeout(self.request_timeout, attempt)
            .await
            .map_err(|_| QueryError::Timeout {
                operation,
                timeout: self.request_timeout,
            })??;

        if status.is_success() {
            return serde_json::from_slice(&bytes).context(DecodeSnafu { operation });
        }

        let error: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        let message = error
            .message
            .clone()
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());

        Err(QueryError::Service {
            operation,
            status: status.as_u16(),
            code: error.code(),
            message,
        })
    }

    fn request(&self, operation: &str, body: Bytes) -> Result<Request<Full<Bytes>>, TransportError> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(HOST, &self.authority)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .body(Full::new(body))
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    async fn send(&self, req: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes), TransportError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(TransportError::Connect)?;

        match &self.tls {
            Some(tls) => {
                let stream = tls
                    .connector
                    .connect(tls.server_name.clone(), stream)
                    .await
                    .map_err(TransportError::Handshake)?;
                exchange(stream, req).await
            }
            None => exchange(stream, req).await,
        }
    }
}

/// Send `req` over a fresh HTTP/1 connection on `stream`.
async fn exchange<S>(stream: S, req: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::warn!("orchestrator connection error: {}", e);
        }
    });

    let resp = sender.send_request(req).await?;
    let status = resp.status();
    let bytes = resp.into_body().collect().await?.to_bytes();

    Ok((status, bytes))
}

fn tls_connector() -> Result<TlsConnector, TransportError> {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config =
        rustls::ClientConfig::builder_with_provider(rustls::crypto::ring::default_provider().into())
            .with_safe_default_protocol_versions()
            .map_err(|e| TransportError::TlsSetup(e.to_string()))?
            .with_root_certificates(root_store)
            .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

fn started_by() -> String {
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    format!("sortie@{hostname}")
        .chars()
        .take(STARTED_BY_MAX)
        .collect()
}

#[async_trait]
impl TaskQueries for EcsClient {
    async fn describe_service(
        &self,
        cluster: &ClusterRef,
        service: &ServiceRef,
    ) -> Result<ServiceSnapshot, QueryError> {
        const OPERATION: &str = "DescribeServices";

        let response: DescribeServicesResponse = self
            .call(
                OPERATION,
                &DescribeServicesRequest {
                    cluster: cluster.identifier(),
                    services: [service.identifier()],
                },
            )
            .await?;

        if let Some(snapshot) = response.services.into_iter().next() {
            return Ok(snapshot);
        }

        match response.failures.first() {
            Some(failure) if failure.reason.as_deref() != Some("MISSING") => {
                Err(QueryError::Rejected {
                    operation: OPERATION,
                    arn: failure.arn().to_string(),
                    reason: failure.reason(),
                })
            }
            _ => Err(QueryError::NotFound {
                operation: OPERATION,
                resource: format!("service {service} in cluster {cluster}"),
            }),
        }
    }

    async fn list_running_task_ids(
        &self,
        cluster: &ClusterRef,
        service: &ServiceRef,
    ) -> Result<Vec<TaskId>, QueryError> {
        let response: ListTasksResponse = self
            .call(
                "ListTasks",
                &ListTasksRequest {
                    cluster: cluster.identifier(),
                    // ListTasks filters by name only.
                    service_name: &service.name,
                    desired_status: "RUNNING",
                    max_results: MAX_TASKS_PER_PAGE,
                },
            )
            .await?;

        if response.next_token.is_some() {
            tracing::debug!(
                service = %service,
                "more than {} running tasks, sampling the first page",
                MAX_TASKS_PER_PAGE
            );
        }

        Ok(response.task_arns)
    }

    async fn describe_tasks(
        &self,
        cluster: &ClusterRef,
        ids: &[TaskId],
    ) -> Result<Vec<TaskSummary>, QueryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = &ids[..ids.len().min(MAX_TASKS_PER_PAGE)];
        let response: TasksResponse = self
            .call(
                "DescribeTasks",
                &DescribeTasksRequest {
                    cluster: cluster.identifier(),
                    tasks: ids,
                },
            )
            .await?;

        for failure in &response.failures {
            // Tasks can stop between ListTasks and DescribeTasks.
            tracing::debug!(task = failure.arn(), reason = %failure.reason(), "task not described");
        }

        Ok(response.tasks)
    }
}

#[async_trait]
impl SpecRegistry for EcsClient {
    async fn describe_task_spec(&self, id: &TaskSpecId) -> Result<RegisteredTaskSpec, QueryError> {
        let response: TaskDefinitionResponse = self
            .call(
                "DescribeTaskDefinition",
                &DescribeTaskDefinitionRequest {
                    task_definition: id.as_str(),
                },
            )
            .await?;

        Ok(response.task_definition)
    }

    async fn register_task_spec(
        &self,
        spec: &TaskSpecification,
    ) -> Result<RegisteredTaskSpec, QueryError> {
        let response: TaskDefinitionResponse = self.call("RegisterTaskDefinition", spec).await?;
        Ok(response.task_definition)
    }
}

#[async_trait]
impl ServiceControl for EcsClient {
    async fn update_service(
        &self,
        cluster: &ClusterRef,
        service: &ServiceRef,
        task_spec: &TaskSpecId,
    ) -> Result<ServiceSnapshot, QueryError> {
        let response: UpdateServiceResponse = self
            .call(
                "UpdateService",
                &UpdateServiceRequest {
                    cluster: cluster.identifier(),
                    service: service.identifier(),
                    task_definition: task_spec.as_str(),
                },
            )
            .await?;

        Ok(response.service)
    }

    async fn run_task(
        &self,
        cluster: &ClusterRef,
        spec: &RegisteredTaskSpec,
        command: &[String],
    ) -> Result<Vec<TaskSummary>, QueryError> {
        const OPERATION: &str = "RunTask";

        let response: TasksResponse = self
            .call(
                OPERATION,
                &RunTaskRequest {
                    cluster: cluster.identifier(),
                    task_definition: spec.id.as_str(),
                    count: 1,
                    started_by: &self.started_by,
                    overrides: TaskOverride {
                        container_overrides: vec![ContainerOverride {
                            name: &spec.spec.primary().name,
                            command,
                        }],
                    },
                },
            )
            .await?;

        if response.tasks.is_empty()
            && let Some(failure) = response.failures.first()
        {
            return Err(QueryError::Rejected {
                operation: OPERATION,
                arn: failure.arn().to_string(),
                reason: failure.reason(),
            });
        }

        Ok(response.tasks)
    }
}
