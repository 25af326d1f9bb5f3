// sampling-workbench/src/templates.rs
use chrono::Utc;
use sampling_protocol::{ReplayTemplate, RequestStatus, SamplingRequest};
use tracing::info;
use uuid::Uuid;

use crate::error::{WorkbenchError, WorkbenchResult};

/// Named responses captured from completed requests.
///
/// Templates own copies of their responses, so they outlive the request they
/// came from. Nothing is removed except through `delete`.
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    templates: Vec<ReplayTemplate>,
}

impl TemplateLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the response of a completed request under `name`
    pub fn save(&mut self, request: &SamplingRequest, name: &str) -> WorkbenchResult<ReplayTemplate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkbenchError::Validation(
                "Template name must not be empty".to_string(),
            ));
        }
        if request.status != RequestStatus::Completed {
            return Err(WorkbenchError::invalid_transition(
                &request.id,
                request.status,
                "save a template from",
            ));
        }
        let response = request.response.clone().ok_or_else(|| {
            WorkbenchError::Validation(format!("Request {} has no response to capture", request.id))
        })?;

        let template = ReplayTemplate {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            response,
            source_request_id: request.id.clone(),
            use_count: 0,
            created_at: Utc::now(),
            last_used: None,
        };
        info!(template_id = %template.id, name = %template.name, "Saved replay template");
        self.templates.push(template.clone());
        Ok(template)
    }

    pub fn get(&self, id: &str) -> Option<&ReplayTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// All templates, in the order they were saved
    pub fn list(&self) -> Vec<ReplayTemplate> {
        self.templates.clone()
    }

    /// Count one replay of the template
    pub fn mark_used(&mut self, id: &str) -> WorkbenchResult<ReplayTemplate> {
        let template = self
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| WorkbenchError::TemplateNotFound(id.to_string()))?;
        template.use_count += 1;
        template.last_used = Some(Utc::now());
        Ok(template.clone())
    }

    pub fn delete(&mut self, id: &str) -> WorkbenchResult<ReplayTemplate> {
        let index = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| WorkbenchError::TemplateNotFound(id.to_string()))?;
        let removed = self.templates.remove(index);
        info!(template_id = %id, name = %removed.name, "Deleted replay template");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampling_protocol::{CreateMessageParams, CreateMessageResult, Message, MessageContent, Role};

    fn completed(id: &str) -> SamplingRequest {
        let mut request = SamplingRequest::new(
            id.to_string(),
            "srv".to_string(),
            "Server".to_string(),
            CreateMessageParams::new(vec![Message::user("hi")]),
        );
        request.status = RequestStatus::Completed;
        request.response = Some(CreateMessageResult {
            role: Role::Assistant,
            content: MessageContent::text("Hello there"),
            model: "m".to_string(),
            stop_reason: None,
            usage: None,
        });
        request
    }

    #[test]
    fn test_save_requires_completed_request() {
        let mut library = TemplateLibrary::new();
        let mut pending = completed("r1");
        pending.status = RequestStatus::Pending;
        pending.response = None;
        assert!(library.save(&pending, "greeting").is_err());
        assert!(library.list().is_empty());
    }

    #[test]
    fn test_save_requires_name() {
        let mut library = TemplateLibrary::new();
        assert!(library.save(&completed("r1"), "  ").is_err());
    }

    #[test]
    fn test_templates_are_independent_copies() {
        let mut library = TemplateLibrary::new();
        let mut source = completed("r1");
        let a = library.save(&source, "greeting").unwrap();
        let b = library.save(&source, "hello").unwrap();
        assert_ne!(a.id, b.id);

        source.response = None;
        drop(source);
        assert_eq!(library.get(&a.id).unwrap().response.content.as_text(), Some("Hello there"));
        assert_eq!(library.get(&b.id).unwrap().response.content.as_text(), Some("Hello there"));
    }

    #[test]
    fn test_mark_used_counts() {
        let mut library = TemplateLibrary::new();
        let template = library.save(&completed("r1"), "greeting").unwrap();
        assert_eq!(template.use_count, 0);
        assert!(template.last_used.is_none());
        let used = library.mark_used(&template.id).unwrap();
        assert_eq!(used.use_count, 1);
        assert!(used.last_used.is_some());
    }

    #[test]
    fn test_delete_unknown_template() {
        let mut library = TemplateLibrary::new();
        assert!(matches!(library.delete("nope"), Err(WorkbenchError::TemplateNotFound(_))));
    }
}
