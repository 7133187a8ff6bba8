// src/transform/copy.rs

use super::{BoxFuture, OutputFile, Transform, TransformError, TransformInput};

/// Copies every input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyTransform;

impl Transform for CopyTransform {
    fn name(&self) -> &str {
        "copy"
    }

    fn apply(
        &self,
        input: TransformInput,
    ) -> BoxFuture<'_, Result<Vec<OutputFile>, TransformError>> {
        Box::pin(async move {
            Ok(input
                .files
                .into_iter()
                .map(|f| OutputFile {
                    rel_path: f.rel_path,
                    contents: f.contents,
                })
                .collect())
        })
    }
}
