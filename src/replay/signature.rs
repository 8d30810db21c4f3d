//! replay::signature
//!
//! Stable identity for one logical API call.

use std::fmt;

/// Identifies a logical API call: forge name, method name, and the ordered
/// argument list.
///
/// Signatures must be deterministic: equal inputs always render the same
/// key, across capture and replay runs. Credentials are never part of a
/// signature, so fixture keys stay stable when tokens rotate.
///
/// # Example
///
/// ```
/// use forgery::replay::CallSignature;
///
/// let sig = CallSignature::new("gitlab", "get_file_content").arg("README.md");
/// assert_eq!(sig.key(), "gitlab.get_file_content(README.md)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSignature {
    forge: String,
    method: String,
    args: Vec<String>,
}

impl CallSignature {
    /// Create a signature for a call with no arguments.
    pub fn new(forge: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            forge: forge.into(),
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument. Order is preserved.
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// The forge this call targets.
    pub fn forge(&self) -> &str {
        &self.forge
    }

    /// The method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Render the signature as the fixture store key,
    /// e.g. `gitlab.get_issue_info(1)`.
    pub fn key(&self) -> String {
        format!("{}.{}({})", self.forge, self.method, self.args.join(", "))
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args() {
        let sig = CallSignature::new("gitlab", "get_tags");
        assert_eq!(sig.key(), "gitlab.get_tags()");
    }

    #[test]
    fn args_render_in_order() {
        let sig = CallSignature::new("gitlab", "create_issue")
            .arg("Issue 2")
            .arg("Description for issue 2");
        assert_eq!(
            sig.key(),
            "gitlab.create_issue(Issue 2, Description for issue 2)"
        );
    }

    #[test]
    fn numeric_args() {
        let sig = CallSignature::new("gitlab", "get_pr_info").arg(1u64);
        assert_eq!(sig.key(), "gitlab.get_pr_info(1)");
    }

    #[test]
    fn equal_inputs_equal_keys() {
        let a = CallSignature::new("gitlab", "get_pr_commits").arg(7u64);
        let b = CallSignature::new("gitlab", "get_pr_commits").arg(7u64);
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn argument_order_matters() {
        let a = CallSignature::new("gitlab", "m").arg("x").arg("y");
        let b = CallSignature::new("gitlab", "m").arg("y").arg("x");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn display_matches_key() {
        let sig = CallSignature::new("gitlab", "get_branches");
        assert_eq!(format!("{}", sig), sig.key());
    }
}
