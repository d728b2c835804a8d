// ABOUTME: SigV4 request signing and AWS profile/region resolution.
// ABOUTME: Credentials come from the standard AWS provider chain and are reused until near expiry.

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use hyper::Request;
use parking_lot::Mutex;
use std::fmt;
use std::time::{Duration, SystemTime};

/// Signing name of the ECS API.
const SERVICE_NAME: &str = "ecs";

/// Credentials this close to expiry are fetched again.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("no AWS region configured (use --region, AWS_REGION, or `region:` in sortie.yml)")]
    NoRegion,

    #[error("no AWS credentials provider available")]
    NoCredentials,

    #[error("could not load credentials: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("could not sign request: {0}")]
    Sign(String),
}

/// Region and credentials resolved from the AWS environment, profile files
/// and instance metadata.
pub struct AwsSession {
    region: Option<String>,
    credentials: Option<SharedCredentialsProvider>,
}

impl AwsSession {
    /// Resolve the session for `profile`, with `region` overriding whatever
    /// the profile or environment says.
    pub async fn load(profile: Option<&str>, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }

        let config = loader.load().await;
        let region = config.region().map(|r| r.to_string());
        tracing::debug!(?profile, ?region, "aws session loaded");

        Self {
            region,
            credentials: config.credentials_provider(),
        }
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// A signer for the session's region and credentials.
    pub fn signer(&self) -> Result<RequestSigner, SigningError> {
        let region = self.region.clone().ok_or(SigningError::NoRegion)?;
        let credentials = self
            .credentials
            .clone()
            .ok_or(SigningError::NoCredentials)?;
        Ok(RequestSigner::new(region, credentials))
    }
}

/// Signs orchestrator requests with AWS Signature Version 4.
pub struct RequestSigner {
    region: String,
    provider: SharedCredentialsProvider,
    cached: Mutex<Option<Credentials>>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(region: impl Into<String>, provider: SharedCredentialsProvider) -> Self {
        Self {
            region: region.into(),
            provider,
            cached: Mutex::new(None),
        }
    }

    /// A signer with fixed credentials.
    pub fn with_credentials(region: impl Into<String>, credentials: Credentials) -> Self {
        Self::new(region, SharedCredentialsProvider::new(credentials))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    async fn credentials(&self) -> Result<Credentials, SigningError> {
        let cached = self.cached.lock().clone();
        if let Some(credentials) = cached
            && is_fresh(&credentials)
        {
            return Ok(credentials);
        }

        let credentials = self.provider.provide_credentials().await?;
        *self.cached.lock() = Some(credentials.clone());
        Ok(credentials)
    }

    /// Add the SigV4 headers for `url` and `body` to `request`.
    pub(crate) async fn sign<B>(
        &self,
        request: &mut Request<B>,
        url: &str,
        body: &[u8],
    ) -> Result<(), SigningError> {
        let identity = self.credentials().await?.into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SERVICE_NAME)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| SigningError::Sign(e.to_string()))?
            .into();

        let instructions = {
            let headers = request
                .headers()
                .iter()
                .map(|(name, value)| value.to_str().map(|v| (name.as_str(), v)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| SigningError::Sign(e.to_string()))?;

            let signable = SignableRequest::new(
                request.method().as_str(),
                url,
                headers.into_iter(),
                SignableBody::Bytes(body),
            )
            .map_err(|e| SigningError::Sign(e.to_string()))?;

            let (instructions, _signature) = sign(signable, &params)
                .map_err(|e| SigningError::Sign(e.to_string()))?
                .into_parts();
            instructions
        };

        instructions.apply_to_request_http1x(request);
        Ok(())
    }
}

fn is_fresh(credentials: &Credentials) -> bool {
    match credentials.expiry() {
        None => true,
        Some(expiry) => expiry > SystemTime::now() + REFRESH_MARGIN,
    }
}
