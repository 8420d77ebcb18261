//! Static routing table from [`EventKind`] to templates and context needs.

use crate::models::{EventCategory, EventKind};

/// Which context entities must resolve before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextProfile {
    UserOnly,
    UserAndEvent,
    UserAndQuestion,
}

impl ContextProfile {
    pub fn needs_event(&self) -> bool {
        matches!(self, ContextProfile::UserAndEvent)
    }

    pub fn needs_question(&self) -> bool {
        matches!(self, ContextProfile::UserAndQuestion)
    }
}

/// Where the rendered email is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The resolved user's address.
    User,
    /// The invitee address carried on the request.
    Invitee,
}

/// Everything the dispatcher needs to know about one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationRoute {
    pub subject_template: &'static str,
    pub body_template: &'static str,
    pub requires: ContextProfile,
    pub category_filter: Option<EventCategory>,
    pub recipient: Recipient,
}

const fn user_route(subject_template: &'static str, body_template: &'static str) -> NotificationRoute {
    NotificationRoute {
        subject_template,
        body_template,
        requires: ContextProfile::UserOnly,
        category_filter: None,
        recipient: Recipient::User,
    }
}

const fn ground_school_route(
    subject_template: &'static str,
    body_template: &'static str,
) -> NotificationRoute {
    NotificationRoute {
        subject_template,
        body_template,
        requires: ContextProfile::UserAndEvent,
        category_filter: Some(EventCategory::GroundSchool),
        recipient: Recipient::User,
    }
}

impl EventKind {
    /// Route for this kind, or `None` for extension points.
    pub fn route(&self) -> Option<NotificationRoute> {
        let route = match self {
            EventKind::UserDeleted => user_route("user_delete_subject", "user_delete_body"),
            EventKind::QuizCompleted => user_route("quiz_complete_subject", "quiz_complete_body"),
            EventKind::EventRsvp => ground_school_route("gs_event_rsvp_subject", "gs_event_rsvp_body"),
            EventKind::EventUpcoming => {
                ground_school_route("gs_event_upcoming_subject", "gs_event_upcoming_body")
            }
            EventKind::EventStarted => ground_school_route("gs_event_start_subject", "gs_event_start_body"),
            EventKind::QuestionAsked => NotificationRoute {
                requires: ContextProfile::UserAndQuestion,
                ..user_route("question_subject", "question_body")
            },
            EventKind::EventRegister => {
                ground_school_route("gs_event_register_subject", "gs_event_register_body")
            }
            EventKind::EventUnregister => {
                ground_school_route("gs_event_unregister_subject", "gs_event_unregister_body")
            }
            EventKind::UserSettingsVerified => {
                user_route("user_settings_verified_subject", "user_settings_verified_body")
            }
            EventKind::UserSettingsChanged => {
                user_route("user_verify_settings_subject", "user_verify_settings_body")
            }
            EventKind::Invite => NotificationRoute {
                recipient: Recipient::Invitee,
                ..ground_school_route("gs_invite_subject", "gs_invite_body")
            },
            EventKind::PasswordReset => user_route("password_reset_subject", "password_reset_body"),
            EventKind::EventLastMinuteRegistration => ground_school_route(
                "gs_event_last_min_registration_subject",
                "gs_event_last_min_registration_body",
            ),
            EventKind::ResendUserSettingsChange
            | EventKind::DisplayMessage
            | EventKind::ReceiveMessage
            | EventKind::EventCompleted => return None,
        };
        Some(route)
    }

    /// Every template id referenced by the routing table.
    pub fn all_template_ids() -> Vec<&'static str> {
        use strum::IntoEnumIterator;

        EventKind::iter()
            .filter_map(|kind| kind.route())
            .flat_map(|route| [route.subject_template, route.body_template])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn test_extension_points_have_no_route() {
        for kind in [
            EventKind::ResendUserSettingsChange,
            EventKind::DisplayMessage,
            EventKind::ReceiveMessage,
            EventKind::EventCompleted,
        ] {
            assert!(kind.route().is_none(), "{kind} should not be routed");
        }
        assert_eq!(EventKind::iter().filter(|k| k.route().is_some()).count(), 13);
    }

    #[test]
    fn test_template_ids_are_unique_and_paired() {
        let ids = EventKind::all_template_ids();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), 26);
        assert_eq!(unique.len(), ids.len());

        for kind in EventKind::iter() {
            if let Some(route) = kind.route() {
                let stem = route.subject_template.trim_end_matches("_subject");
                assert_eq!(route.body_template, format!("{stem}_body"));
            }
        }
    }

    #[test]
    fn test_category_filtered_kinds() {
        let filtered: HashSet<EventKind> = EventKind::iter()
            .filter(|k| k.route().and_then(|r| r.category_filter).is_some())
            .collect();
        let expected: HashSet<EventKind> = [
            EventKind::EventRsvp,
            EventKind::EventUpcoming,
            EventKind::EventStarted,
            EventKind::EventRegister,
            EventKind::EventUnregister,
            EventKind::Invite,
            EventKind::EventLastMinuteRegistration,
        ]
        .into_iter()
        .collect();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn test_question_and_invite_routes() {
        let question = EventKind::QuestionAsked.route().unwrap();
        assert!(question.requires.needs_question());
        assert_eq!(question.category_filter, None);

        let invite = EventKind::Invite.route().unwrap();
        assert_eq!(invite.recipient, Recipient::Invitee);
        assert!(invite.requires.needs_event());

        let reset = EventKind::PasswordReset.route().unwrap();
        assert_eq!(reset.subject_template, "password_reset_subject");
        assert_eq!(reset.requires, ContextProfile::UserOnly);
    }
}
