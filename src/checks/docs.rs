use super::{CheckContext, PullRequestCheck};

const DOCS_DIR: &str = "docs/content/";
const CHINESE_DOCS_DIR: &str = "docs/content.zh/";

/// Reminds contributors to update the English and Chinese documentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentationCheck;

impl PullRequestCheck for DocumentationCheck {
    fn run_check(&self, ctx: &CheckContext) -> Option<String> {
        let markdown = || ctx.files.iter().filter(|file| file.ends_with(".md"));
        let docs = markdown().filter(|file| file.contains(DOCS_DIR)).count();
        let chinese = markdown()
            .filter(|file| file.contains(CHINESE_DOCS_DIR))
            .count();

        if docs == 0 {
            Some(
                "No documentation files were touched! Remember to keep the Flink docs up to date!"
                    .to_string(),
            )
        } else if chinese == 0 {
            Some(format!(
                "Documentation files were touched, but no `{CHINESE_DOCS_DIR}` files: Update Chinese documentation or file Jira ticket."
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(files: &[&str]) -> Option<String> {
        let ctx = CheckContext {
            files: files.iter().map(|f| f.to_string()).collect(),
            ..CheckContext::default()
        };
        DocumentationCheck.run_check(&ctx)
    }

    #[test]
    fn untouched_docs_warn() {
        assert!(check(&["flink-core/src/Foo.java"]).unwrap().starts_with("No documentation"));
    }

    #[test]
    fn english_only_docs_warn_about_chinese() {
        let warning = check(&["docs/content/docs/index.md"]).unwrap();
        assert!(warning.contains("`docs/content.zh/`"));
    }

    #[test]
    fn non_markdown_files_in_docs_do_not_count() {
        assert!(check(&["docs/content/static/logo.png"]).unwrap().starts_with("No documentation"));
    }

    #[test]
    fn both_languages_pass() {
        assert_eq!(
            check(&["docs/content/docs/index.md", "docs/content.zh/docs/index.md"]),
            None
        );
    }
}
