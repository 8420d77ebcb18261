//! Email template rendering.
//!
//! Templates are Handlebars sources keyed by a stable id such as
//! `password_reset_subject`. Files whose name starts with `_` are partials
//! (`_header.hbs` is available as `{{> header}}`).

use async_trait::async_trait;
use handlebars::{Handlebars, HelperDef};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::context::TemplateContext;
use crate::error::{NotificationError, NotificationResult};

/// Renders a template id against a [`TemplateContext`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Render `template_id`. Missing templates, malformed templates and
    /// unbound variables all fail with [`NotificationError::Render`].
    async fn render(&self, template_id: &str, context: &TemplateContext) -> NotificationResult<String>;
}

const TEMPLATE_EXTENSION: &str = "hbs";

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("_footer", include_str!("../../templates/_footer.hbs")),
    ("_header", include_str!("../../templates/_header.hbs")),
    ("gs_event_last_min_registration_body", include_str!("../../templates/gs_event_last_min_registration_body.hbs")),
    ("gs_event_last_min_registration_subject", include_str!("../../templates/gs_event_last_min_registration_subject.hbs")),
    ("gs_event_register_body", include_str!("../../templates/gs_event_register_body.hbs")),
    ("gs_event_register_subject", include_str!("../../templates/gs_event_register_subject.hbs")),
    ("gs_event_rsvp_body", include_str!("../../templates/gs_event_rsvp_body.hbs")),
    ("gs_event_rsvp_subject", include_str!("../../templates/gs_event_rsvp_subject.hbs")),
    ("gs_event_start_body", include_str!("../../templates/gs_event_start_body.hbs")),
    ("gs_event_start_subject", include_str!("../../templates/gs_event_start_subject.hbs")),
    ("gs_event_unregister_body", include_str!("../../templates/gs_event_unregister_body.hbs")),
    ("gs_event_unregister_subject", include_str!("../../templates/gs_event_unregister_subject.hbs")),
    ("gs_event_upcoming_body", include_str!("../../templates/gs_event_upcoming_body.hbs")),
    ("gs_event_upcoming_subject", include_str!("../../templates/gs_event_upcoming_subject.hbs")),
    ("gs_invite_body", include_str!("../../templates/gs_invite_body.hbs")),
    ("gs_invite_subject", include_str!("../../templates/gs_invite_subject.hbs")),
    ("password_reset_body", include_str!("../../templates/password_reset_body.hbs")),
    ("password_reset_subject", include_str!("../../templates/password_reset_subject.hbs")),
    ("question_body", include_str!("../../templates/question_body.hbs")),
    ("question_subject", include_str!("../../templates/question_subject.hbs")),
    ("quiz_complete_body", include_str!("../../templates/quiz_complete_body.hbs")),
    ("quiz_complete_subject", include_str!("../../templates/quiz_complete_subject.hbs")),
    ("user_delete_body", include_str!("../../templates/user_delete_body.hbs")),
    ("user_delete_subject", include_str!("../../templates/user_delete_subject.hbs")),
    ("user_settings_verified_body", include_str!("../../templates/user_settings_verified_body.hbs")),
    ("user_settings_verified_subject", include_str!("../../templates/user_settings_verified_subject.hbs")),
    ("user_verify_settings_body", include_str!("../../templates/user_verify_settings_body.hbs")),
    ("user_verify_settings_subject", include_str!("../../templates/user_verify_settings_subject.hbs")),
];

/// Handlebars-backed renderer.
///
/// Strict mode is on, so a reference to a variable the context does not
/// provide is an error rather than an empty string.
///
/// Rendering runs on the blocking pool so a caller's timeout can fire while
/// a slow template is still being evaluated.
pub struct HandlebarsRenderer {
    handlebars: Arc<Handlebars<'static>>,
}

impl HandlebarsRenderer {
    /// Empty renderer with no templates registered.
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        Self {
            handlebars: Arc::new(handlebars),
        }
    }

    /// Renderer with the built-in template set.
    pub fn with_defaults() -> NotificationResult<Self> {
        let mut renderer = Self::new();
        for (name, source) in DEFAULT_TEMPLATES {
            renderer.register(name, source)?;
        }

        debug!(count = DEFAULT_TEMPLATES.len(), "Registered default email templates");
        Ok(renderer)
    }

    /// Load every `*.hbs` file in `dir`. The file stem becomes the template id.
    pub fn from_directory(dir: impl AsRef<Path>) -> NotificationResult<Self> {
        let dir = dir.as_ref();
        let mut renderer = Self::new();
        let mut loaded = 0usize;

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let source = std::fs::read_to_string(&path)?;
            renderer.register(name, &source)?;
            loaded += 1;
        }

        info!(dir = %dir.display(), count = loaded, "Loaded email templates from directory");
        Ok(renderer)
    }

    /// Register a template, or a partial when `name` starts with `_`.
    pub fn register(&mut self, name: &str, source: &str) -> NotificationResult<()> {
        let handlebars = Arc::make_mut(&mut self.handlebars);
        let result = match name.strip_prefix('_') {
            Some(partial) => handlebars.register_partial(partial, source),
            None => handlebars.register_template_string(name, source),
        };

        result.map_err(|e| NotificationError::render(name, format!("failed to register: {}", e)))
    }

    /// Register a custom helper, e.g. for date or currency formatting.
    pub fn register_helper(&mut self, name: &str, helper: Box<dyn HelperDef + Send + Sync + 'static>) {
        Arc::make_mut(&mut self.handlebars).register_helper(name, helper);
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateRenderer for HandlebarsRenderer {
    async fn render(&self, template_id: &str, context: &TemplateContext) -> NotificationResult<String> {
        let handlebars = Arc::clone(&self.handlebars);
        let id = template_id.to_string();
        let context = context.clone();

        tokio::task::spawn_blocking(move || handlebars.render(&id, &context))
            .await
            .map_err(|e| NotificationError::render(template_id, format!("render task failed: {}", e)))?
            .map_err(|e| NotificationError::render(template_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationConfig;
    use crate::models::{Event, EventCategory, EventKind, Question, User};
    use chrono::{TimeZone, Utc};

    fn context(with_event: bool, with_question: bool) -> TemplateContext {
        let user = User {
            id: 7,
            username: "jdoe".to_string(),
            first_name: "Jane".to_string(),
            last_name: "O'Neil".to_string(),
            email: "a@b.com".to_string(),
        };
        let event = Event {
            id: 3,
            title: "Weather & Airspace".to_string(),
            description: "METARs and TAFs".to_string(),
            location: "Hangar 2".to_string(),
            starts_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
            category: EventCategory::GroundSchool,
        };
        let question = Question {
            id: 11,
            text: "What is Vx?".to_string(),
            asked_by: None,
        };
        TemplateContext::build(
            &user,
            with_event.then_some(&event),
            with_question.then_some(&question),
            &NotificationConfig::new("noreply@example.com"),
        )
    }

    #[test]
    fn test_defaults_cover_every_route() {
        let renderer = HandlebarsRenderer::with_defaults().unwrap();
        for id in EventKind::all_template_ids() {
            assert!(renderer.has_template(id), "missing default template {id}");
        }
    }

    #[tokio::test]
    async fn test_every_default_template_renders() {
        use strum::IntoEnumIterator;

        let renderer = HandlebarsRenderer::with_defaults().unwrap();
        for kind in EventKind::iter() {
            let Some(route) = kind.route() else { continue };
            let ctx = context(route.requires.needs_event(), route.requires.needs_question());

            let subject = renderer.render(route.subject_template, &ctx).await.unwrap();
            let body = renderer.render(route.body_template, &ctx).await.unwrap();
            assert!(!subject.trim().is_empty(), "{kind} subject is empty");
            assert!(!subject.contains('\n'), "{kind} subject spans lines");
            assert!(body.contains("<html"), "{kind} body is not html");
            assert!(body.contains("noreply@example.com"), "{kind} body lacks support address");
        }
    }

    #[tokio::test]
    async fn test_subject_is_not_html_escaped_but_body_is() {
        let renderer = HandlebarsRenderer::with_defaults().unwrap();
        let ctx = context(true, false);

        let subject = renderer.render("gs_event_rsvp_subject", &ctx).await.unwrap();
        assert_eq!(subject, "Please RSVP: Weather & Airspace");

        let body = renderer.render("gs_event_rsvp_body", &ctx).await.unwrap();
        assert!(body.contains("Weather &amp; Airspace"));
    }

    #[tokio::test]
    async fn test_missing_template_is_render_error() {
        let renderer = HandlebarsRenderer::with_defaults().unwrap();
        let err = renderer.render("no_such_template", &context(false, false)).await.unwrap_err();
        match err {
            NotificationError::Render { template_id, .. } => assert_eq!(template_id, "no_such_template"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unbound_variable_is_render_error() {
        let mut renderer = HandlebarsRenderer::new();
        renderer.register("broken_subject", "Hello {{user.nickname}}").unwrap();

        let err = renderer.render("broken_subject", &context(false, false)).await.unwrap_err();
        assert!(matches!(err, NotificationError::Render { .. }));
    }

    #[test]
    fn test_malformed_template_fails_registration() {
        let mut renderer = HandlebarsRenderer::new();
        let err = renderer.register("bad_body", "{{#if user}}never closed").unwrap_err();
        assert!(matches!(err, NotificationError::Render { .. }));
    }

    #[tokio::test]
    async fn test_from_directory() {
        let dir = std::env::temp_dir().join(format!("notification-templates-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("_sig.hbs"), "-- {{organization_name}}").unwrap();
        std::fs::write(dir.join("quiz_complete_subject.hbs"), "Done, {{{user.first_name}}}").unwrap();
        std::fs::write(dir.join("quiz_complete_body.hbs"), "<p>{{user.email}}</p>{{> sig}}").unwrap();
        std::fs::write(dir.join("README.txt"), "ignored").unwrap();

        let renderer = HandlebarsRenderer::from_directory(&dir).unwrap();
        let ctx = context(false, false);
        assert_eq!(renderer.render("quiz_complete_subject", &ctx).await.unwrap(), "Done, Jane");
        assert_eq!(
            renderer.render("quiz_complete_body", &ctx).await.unwrap(),
            "<p>a@b.com</p>-- Ground School"
        );
        assert!(!renderer.has_template("README"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    fn stall(
        _: &handlebars::Helper,
        _: &Handlebars,
        _: &handlebars::Context,
        _: &mut handlebars::RenderContext,
        _: &mut dyn handlebars::Output,
    ) -> handlebars::HelperResult {
        std::thread::sleep(std::time::Duration::from_millis(300));
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_render_does_not_block_caller_timeout() {
        let mut renderer = HandlebarsRenderer::new();
        renderer.register_helper("stall", Box::new(stall));
        renderer.register("slow_subject", "{{stall}}Hello").unwrap();

        let started = std::time::Instant::now();
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            renderer.render("slow_subject", &context(false, false)),
        )
        .await;

        assert!(result.is_err(), "render should still be running");
        assert!(started.elapsed() < std::time::Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_register_after_render_keeps_earlier_templates() {
        let mut renderer = HandlebarsRenderer::new();
        renderer.register("greeting", "Hi {{user.first_name}}").unwrap();
        let ctx = context(false, false);
        assert_eq!(renderer.render("greeting", &ctx).await.unwrap(), "Hi Jane");

        renderer.register("farewell", "Bye {{user.first_name}}").unwrap();
        assert_eq!(renderer.render("farewell", &ctx).await.unwrap(), "Bye Jane");
        assert!(renderer.has_template("greeting"));
    }

    #[test]
    fn test_from_missing_directory_fails() {
        let result = HandlebarsRenderer::from_directory("/definitely/not/here");
        assert!(matches!(result, Err(NotificationError::Config(_))));
    }
}
