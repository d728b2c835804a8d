// ABOUTME: Copy-on-write versioning of task specifications.
// ABOUTME: Rewrites the primary container's image tag and reads the deployed tag.

use crate::types::{ImageReference, ParseImageRefError, TaskSpecification};

/// Produce a new task specification pointing the primary container at
/// `new_tag` in the same repository.
///
/// The result is a deep copy of `spec`; only `container_definitions[0].image`
/// differs. Sidecar images are copied verbatim whether or not they carry a tag.
///
/// # Errors
///
/// Returns `ParseImageRefError` if the primary image is not `<repository>:<tag>`
/// or `new_tag` is not a valid tag. Nothing is produced in that case.
pub fn rewrite_image(
    spec: &TaskSpecification,
    new_tag: &str,
) -> Result<TaskSpecification, ParseImageRefError> {
    let current = spec.primary().image_reference()?;
    let next = current.with_tag(new_tag)?;

    let mut rewritten = spec.clone();
    rewritten.container_definitions.head.image = next.to_string();

    tracing::debug!(
        family = %spec.family,
        from = %current,
        to = %next,
        "rewrote primary image"
    );

    Ok(rewritten)
}

/// Tag portion of a combined `<repository>:<tag>` image string.
pub fn extract_tag(image: &str) -> Result<String, ParseImageRefError> {
    ImageReference::parse(image).map(|r| r.tag().to_string())
}

/// Tag currently referenced by a specification's primary container.
pub fn current_tag(spec: &TaskSpecification) -> Result<String, ParseImageRefError> {
    extract_tag(&spec.primary().image)
}
