use crate::error::CorpusError;
use crate::id::ContextId;
use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// ContextDocument
// ---------------------------------------------------------------------------

/// A parsed context file: YAML frontmatter plus raw markdown body.
///
/// The frontmatter is kept as an order-preserving mapping so keys the engine
/// doesn't know about survive a round trip in their original position.
#[derive(Debug, Clone)]
pub struct ContextDocument {
    pub frontmatter: Mapping,
    pub body: String,
}

impl ContextDocument {
    /// Build a fresh document for a newly created context.
    pub fn new(id: &ContextId, title: &str, project: &str, created: NaiveDate) -> Self {
        let mut frontmatter = Mapping::new();
        frontmatter.insert(
            Value::from("context_id"),
            Value::from(id.to_string()),
        );
        frontmatter.insert(Value::from("title"), Value::from(title));
        frontmatter.insert(Value::from("project"), Value::from(project));
        frontmatter.insert(
            Value::from("created"),
            Value::from(created.format("%Y-%m-%d").to_string()),
        );

        let body = format!(
            "# {id}: {title}\n\n## Outcome\n\nDescribe the outcome this context delivers.\n\n## Next Actions\n\n| Test | Description | Outcome |\n| ---- | ----------- | ------- |\n"
        );

        Self { frontmatter, body }
    }

    /// Parse a context file. `path` is used only for error reporting.
    pub fn parse(path: &Path, content: &str) -> std::result::Result<Self, CorpusError> {
        let rest = content.strip_prefix("---\n").ok_or_else(|| {
            CorpusError::BadManifest {
                path: path.to_path_buf(),
                reason: "missing frontmatter delimiter".to_string(),
            }
        })?;
        let end = rest.find("\n---").ok_or_else(|| CorpusError::BadManifest {
            path: path.to_path_buf(),
            reason: "unterminated frontmatter".to_string(),
        })?;
        let yaml = &rest[..end];
        let mut body = &rest[end + 4..];
        // Consume the delimiter line's own terminator, then the blank
        // separator line `render` writes, so parse and render round-trip.
        body = body.strip_prefix('\n').unwrap_or(body);
        body = body.strip_prefix('\n').unwrap_or(body);

        let frontmatter: Mapping = serde_yaml::from_str(yaml)?;
        Ok(Self {
            frontmatter,
            body: body.to_string(),
        })
    }

    /// Render back to file content.
    pub fn render(&self) -> std::result::Result<String, CorpusError> {
        let yaml = serde_yaml::to_string(&self.frontmatter)?;
        Ok(format!("---\n{yaml}---\n\n{}", self.body))
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.frontmatter.get(key).and_then(Value::as_str)
    }

    /// The `context_id` frontmatter field, parsed.
    pub fn context_id(&self) -> Option<ContextId> {
        self.str_field("context_id")?.parse().ok()
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn project(&self) -> Option<&str> {
        self.str_field("project")
    }

    /// ID embedded in the first H1 header (`# PREFIX_NNN: Title`), if any.
    pub fn h1_id(&self) -> Option<ContextId> {
        let line = self.body.lines().find(|l| l.starts_with("# "))?;
        let token = crate::id::id_token_re().find(line)?;
        token.as_str().parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        ContextDocument::new(
            &ContextId::new("NEX", 1).unwrap(),
            "User Login",
            "nexus",
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        )
        .render()
        .unwrap()
    }

    #[test]
    fn new_document_has_matching_ids() {
        let content = sample();
        let doc = ContextDocument::parse(Path::new("NEX_001-user-login.md"), &content).unwrap();
        assert_eq!(doc.context_id().unwrap().to_string(), "NEX_001");
        assert_eq!(doc.h1_id().unwrap().to_string(), "NEX_001");
        assert_eq!(doc.title(), Some("User Login"));
        assert_eq!(doc.project(), Some("nexus"));
    }

    #[test]
    fn parse_render_round_trip_is_stable() {
        let content = sample();
        let doc = ContextDocument::parse(Path::new("x.md"), &content).unwrap();
        assert_eq!(doc.render().unwrap(), content);
    }

    #[test]
    fn parse_preserves_unknown_keys_in_order() {
        let content = "---\ncontext_id: NEX_002\ncustom: kept\ntitle: T\n---\n\n# NEX_002: T\n";
        let doc = ContextDocument::parse(Path::new("x.md"), content).unwrap();
        let rendered = doc.render().unwrap();
        let ctx_pos = rendered.find("context_id").unwrap();
        let custom_pos = rendered.find("custom").unwrap();
        let title_pos = rendered.find("title").unwrap();
        assert!(ctx_pos < custom_pos && custom_pos < title_pos);
    }

    #[test]
    fn parse_rejects_missing_frontmatter() {
        let err = ContextDocument::parse(Path::new("x.md"), "# NEX_001: no frontmatter\n");
        assert!(err.is_err());
    }

    #[test]
    fn h1_id_ignores_lower_headers() {
        let content = "---\ncontext_id: NEX_003\n---\n\n## NEX_009 not an h1\n\n# NEX_003: Real\n";
        let doc = ContextDocument::parse(Path::new("x.md"), content).unwrap();
        assert_eq!(doc.h1_id().unwrap().to_string(), "NEX_003");
    }
}
