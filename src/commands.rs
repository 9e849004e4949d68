//! Handlers behind the `headshakers` subcommands.

use std::fmt::Write as _;

use crate::{
    cache::{CacheConfig, InvalidationEvent, TagLimits, invalidation::tags_for_events},
    config::{LogFormat, Settings},
    error::AppError,
};

/// Tags one event invalidates under the configured limits.
pub fn event_tags(event: &InvalidationEvent, limits: TagLimits) -> Result<Vec<String>, AppError> {
    event
        .tags(limits)
        .map_err(|err| AppError::tags(event.name(), err))
}

/// Merged, de-duplicated tags for a batch of events in first-seen order.
///
/// Limits apply to each event's own tag set, not to the merged list.
pub fn merged_event_tags(
    events: &[InvalidationEvent],
    limits: TagLimits,
) -> Result<Vec<String>, AppError> {
    tags_for_events(events, limits).map_err(|err| {
        let failed = events
            .iter()
            .find(|event| event.tags(limits).is_err())
            .map_or("events", InvalidationEvent::name);
        AppError::tags(failed, err)
    })
}

pub fn render_tags(tags: &[String], json: bool) -> Result<String, AppError> {
    if json {
        return Ok(serde_json::to_string_pretty(tags)?);
    }
    Ok(tags.join("\n"))
}

pub fn settings_summary(settings: &Settings) -> String {
    let cache = CacheConfig::from(&settings.cache);
    let format = match settings.logging.format {
        LogFormat::Json => "json",
        LogFormat::Compact => "compact",
    };

    let mut out = String::new();
    let _ = writeln!(out, "logging.level = {}", settings.logging.level);
    let _ = writeln!(out, "logging.format = {format}");
    let _ = writeln!(out, "cache.enabled = {}", cache.enabled);
    let _ = writeln!(out, "cache.capacity = {}", cache.capacity);
    let _ = writeln!(out, "cache.max_tags = {}", cache.limits.max_tags);
    let _ = writeln!(out, "cache.max_tag_length = {}", cache.limits.max_tag_length);
    let _ = writeln!(out, "cache.ttl.short = {}s", cache.ttl.short.as_secs());
    let _ = writeln!(out, "cache.ttl.medium = {}s", cache.ttl.medium.as_secs());
    let _ = writeln!(out, "cache.ttl.long = {}s", cache.ttl.long.as_secs());
    let _ = write!(out, "cache.ttl.extended = {}s", cache.ttl.extended.as_secs());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheTagError, EntityKind};

    fn bobblehead_change() -> InvalidationEvent {
        InvalidationEvent::BobbleheadChange {
            bobblehead_id: "b1".to_string(),
            user_id: "u1".to_string(),
            collection_id: None,
        }
    }

    #[test]
    fn event_tags_match_the_event_itself() {
        let event = bobblehead_change();
        let tags = event_tags(&event, TagLimits::default()).unwrap();
        assert_eq!(tags, event.tags(TagLimits::DEFAULT).unwrap());
    }

    #[test]
    fn merged_tags_keep_first_seen_order() {
        let events = [
            bobblehead_change(),
            InvalidationEvent::UserChange {
                user_id: "u1".to_string(),
            },
        ];
        let tags = merged_event_tags(&events, TagLimits::default()).unwrap();

        assert_eq!(tags[0], "bobblehead:b1");
        assert_eq!(tags.iter().filter(|tag| *tag == "user:u1").count(), 1);
    }

    #[test]
    fn configured_limits_are_enforced() {
        let limits = TagLimits {
            max_tags: 2,
            ..TagLimits::default()
        };
        let err = event_tags(&bobblehead_change(), limits).unwrap_err();
        assert!(matches!(
            err,
            AppError::Tags {
                event: "bobblehead-change",
                source: CacheTagError::TagLimitExceeded { max: 2, .. },
            }
        ));
    }

    #[test]
    fn looser_limits_admit_longer_ids() {
        let event = InvalidationEvent::UserChange {
            user_id: "u".repeat(95),
        };
        let limits = TagLimits {
            max_tags: 50,
            max_tag_length: 200,
        };

        assert!(event_tags(&event, TagLimits::default()).is_err());
        let tags = event_tags(&event, limits).unwrap();
        assert_eq!(tags.len(), 4);
        assert_eq!(merged_event_tags(&[event], limits).unwrap(), tags);
    }

    #[test]
    fn merged_errors_name_the_failing_event() {
        let events = [
            bobblehead_change(),
            InvalidationEvent::AnalyticsView {
                entity_type: EntityKind::User,
                entity_id: "u1".to_string(),
            },
        ];
        let err = merged_event_tags(&events, TagLimits::default()).unwrap_err();
        assert!(matches!(
            err,
            AppError::Tags {
                event: "analytics-view",
                source: CacheTagError::UnsupportedEntity { .. },
            }
        ));
    }

    #[test]
    fn unsupported_events_name_the_event() {
        let event = InvalidationEvent::SocialInteraction {
            entity_type: EntityKind::Tag,
            entity_id: "t1".to_string(),
            user_id: "u1".to_string(),
        };
        let err = event_tags(&event, TagLimits::default()).unwrap_err();
        assert!(err.to_string().starts_with("cannot compute tags for `social-interaction`"));
    }

    #[test]
    fn render_plain_and_json() {
        let tags = vec!["featured".to_string(), "trending".to_string()];
        assert_eq!(render_tags(&tags, false).unwrap(), "featured\ntrending");
        assert_eq!(
            render_tags(&tags, true).unwrap(),
            "[\n  \"featured\",\n  \"trending\"\n]"
        );
    }
}
