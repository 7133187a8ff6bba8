// src/transform/include.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

use super::{BoxFuture, OutputFile, Transform, TransformError, TransformInput};
use crate::fs::FileSystem;

/// Where relative include paths are resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeBase {
    /// Directory of the file containing the directive (`"@file"`).
    File,
    /// The source root the file was collected from (`"@root"`).
    Root,
    /// A fixed directory.
    Dir(PathBuf),
}

impl IncludeBase {
    /// Parse a `basepath` setting; plain paths are relative to `project_root`.
    pub fn parse(basepath: &str, project_root: &Path) -> Self {
        match basepath {
            "@file" => IncludeBase::File,
            "@root" => IncludeBase::Root,
            dir => IncludeBase::Dir(project_root.join(dir)),
        }
    }
}

/// Expands `<prefix>include('path')` directives, recursively.
#[derive(Debug, Clone)]
pub struct IncludeTransform {
    directive: Regex,
    base: IncludeBase,
    fs: Arc<dyn FileSystem>,
}

impl IncludeTransform {
    pub fn new(prefix: &str, base: IncludeBase, fs: Arc<dyn FileSystem>) -> Result<Self, regex::Error> {
        let directive = Regex::new(&format!(
            r#"{}include\(\s*['"]([^'"]+)['"]\s*\)"#,
            regex::escape(prefix)
        ))?;
        Ok(Self { directive, base, fs })
    }

    fn expand(
        &self,
        text: &str,
        file: &Path,
        root: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, TransformError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in self.directive.captures_iter(text) {
            let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);

            let path = self.resolve(target.as_str(), file, root);
            if stack.contains(&path) {
                return Err(TransformError::IncludeCycle(path));
            }

            let included = self.fs.read_to_string(&path).map_err(|e| {
                TransformError::Failed(format!("{file:?}: cannot include {path:?}: {e:#}"))
            })?;

            stack.push(path.clone());
            let expanded = self.expand(&included, &path, root, stack)?;
            stack.pop();

            out.push_str(&expanded);
            last = whole.end();
        }

        out.push_str(&text[last..]);
        Ok(out)
    }

    fn resolve(&self, target: &str, file: &Path, root: &Path) -> PathBuf {
        let base = match &self.base {
            IncludeBase::File => file.parent().unwrap_or(root),
            IncludeBase::Root => root,
            IncludeBase::Dir(dir) => dir.as_path(),
        };
        normalize(&base.join(target))
    }
}

/// Lexically fold `.` and `..` components so cycle detection compares like
/// with like.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {
                if out.as_os_str().is_empty() {
                    out.push(".");
                }
            }
            Component::ParentDir => {
                if !out.pop() || out.as_os_str().is_empty() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl Transform for IncludeTransform {
    fn name(&self) -> &str {
        "include"
    }

    fn apply(
        &self,
        input: TransformInput,
    ) -> BoxFuture<'_, Result<Vec<OutputFile>, TransformError>> {
        Box::pin(async move {
            let mut outputs = Vec::with_capacity(input.files.len());
            for file in input.files {
                let text = String::from_utf8(file.contents).map_err(|_| {
                    TransformError::Failed(format!("{:?} is not valid UTF-8", file.path))
                })?;
                let mut stack = vec![normalize(&file.path)];
                let expanded = self.expand(&text, &file.path, &input.root, &mut stack)?;
                outputs.push(OutputFile {
                    rel_path: file.rel_path,
                    contents: expanded.into_bytes(),
                });
            }
            Ok(outputs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::transform::SourceFile;

    fn transform(fs: &MockFileSystem, base: IncludeBase) -> IncludeTransform {
        IncludeTransform::new("@@", base, Arc::new(fs.clone())).unwrap()
    }

    fn page(root: &Path, rel: &str, body: &str) -> TransformInput {
        TransformInput {
            root: root.to_path_buf(),
            files: vec![SourceFile::new(root, rel, body)],
        }
    }

    #[tokio::test]
    async fn expands_nested_includes_relative_to_file() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/include/header.html", "<header>@@include('nav.html')</header>");
        fs.add_file("./src/include/nav.html", "<nav/>");
        let root = Path::new("./src");

        let out = transform(&fs, IncludeBase::File)
            .apply(page(root, "index.html", "@@include('./include/header.html')<main/>"))
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out[0].contents.clone()).unwrap(),
            "<header><nav/></header><main/>"
        );
    }

    #[tokio::test]
    async fn root_base_resolves_from_source_root() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/include/footer.html", "<footer/>");
        let root = Path::new("./src");

        let out = transform(&fs, IncludeBase::Root)
            .apply(page(root, "html/about.html", "@@include(\"include/footer.html\")"))
            .await
            .unwrap();

        assert_eq!(out[0].contents, b"<footer/>");
        assert_eq!(out[0].rel_path, PathBuf::from("html/about.html"));
    }

    #[tokio::test]
    async fn include_cycle_is_an_error() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/a.html", "@@include('b.html')");
        fs.add_file("./src/b.html", "@@include('a.html')");
        let root = Path::new("./src");

        let err = transform(&fs, IncludeBase::File)
            .apply(page(root, "a.html", "@@include('b.html')"))
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::IncludeCycle(_)));
    }

    #[tokio::test]
    async fn missing_include_names_the_file() {
        let fs = MockFileSystem::new();
        let root = Path::new("./src");

        let err = transform(&fs, IncludeBase::File)
            .apply(page(root, "index.html", "@@include('gone.html')"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("gone.html"));
    }

    #[test]
    fn normalize_folds_dot_components() {
        assert_eq!(
            normalize(Path::new("./src/html/../include/./a.html")),
            PathBuf::from("./src/include/a.html")
        );
    }
}
