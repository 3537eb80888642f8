use super::{CheckContext, PullRequestCheck};

/// Flags changes to Maven build files, which need a licensing review.
#[derive(Debug, Clone, Copy, Default)]
pub struct PomChangesCheck;

impl PullRequestCheck for PomChangesCheck {
    fn run_check(&self, ctx: &CheckContext) -> Option<String> {
        let poms = ctx
            .files
            .iter()
            .filter(|file| file.ends_with("pom.xml"))
            .count();
        (poms > 0).then(|| {
            format!("**{poms} pom.xml files were touched**: Check for build and licensing issues.")
        })
    }
}
