// src/transform/concat.rs

use std::path::PathBuf;

use super::{BoxFuture, OutputFile, Transform, TransformError, TransformInput};

/// Joins all inputs, in relative-path order, into a single output file.
#[derive(Debug, Clone)]
pub struct ConcatTransform {
    output: PathBuf,
    separator: String,
}

impl ConcatTransform {
    pub fn new(output: impl Into<PathBuf>, separator: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            separator: separator.into(),
        }
    }
}

impl Transform for ConcatTransform {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(
        &self,
        input: TransformInput,
    ) -> BoxFuture<'_, Result<Vec<OutputFile>, TransformError>> {
        Box::pin(async move {
            if input.files.is_empty() {
                return Ok(Vec::new());
            }

            let mut files = input.files;
            files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

            let mut contents = Vec::new();
            for (i, file) in files.into_iter().enumerate() {
                if i > 0 {
                    contents.extend_from_slice(self.separator.as_bytes());
                }
                contents.extend(file.contents);
            }

            Ok(vec![OutputFile {
                rel_path: self.output.clone(),
                contents,
            }])
        })
    }
}
