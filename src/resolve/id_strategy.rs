//! Identifier-based resolve-or-create strategy.

use smallvec::smallvec;
use tracing::{debug, warn};

use crate::model::{Entity, PropertyMap, SecurityContext, Value, TYPE_KEY};
use crate::property::PropertyKey;
use crate::schema::EntityType;
use crate::search::{self, Search, SearchAttributes};
use crate::storage::Store;
use crate::tx::run_in_transaction;
use crate::{Error, Result};
use super::{DeserializationStrategy, MatchPolicy, ResolverConfig, Source};

/// Resolves scalars as identifiers and structured forms as property
/// matches; creates a new entity for absent input when configured to.
#[derive(Debug, Clone, Default)]
pub struct IdDeserializationStrategy {
    /// The property being resolved, for diagnostics.
    property_key: Option<PropertyKey>,
    config: ResolverConfig,
}

impl IdDeserializationStrategy {
    pub fn new(property_key: Option<PropertyKey>, create_if_not_existing: bool) -> Self {
        Self::with_config(
            property_key,
            ResolverConfig { create_if_not_existing, ..ResolverConfig::default() },
        )
    }

    pub fn with_config(property_key: Option<PropertyKey>, config: ResolverConfig) -> Self {
        Self { property_key, config }
    }

    pub fn property_key(&self) -> Option<&PropertyKey> {
        self.property_key.as_ref()
    }

    pub fn create_if_not_existing(&self) -> bool {
        self.config.create_if_not_existing
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn property_name(&self) -> Option<&str> {
        self.property_key.as_ref().map(PropertyKey::name)
    }

    fn predicates(&self, target: &EntityType, source: &Source) -> Result<SearchAttributes> {
        let mut attrs: SearchAttributes = match source {
            Source::Structured(map) => target
                .convert_input(map)?
                .into_iter()
                .map(|(key, value)| {
                    if value.is_null() {
                        return Err(Error::Conversion {
                            key: key.name().to_string(),
                            value: "null".to_string(),
                            expected: key.kind().value_type().to_string(),
                        });
                    }
                    Search::exact_property(key, value)
                })
                .collect::<Result<_>>()?,
            Source::Scalar(value) => smallvec![Search::exact_uuid(Source::scalar_string(value))],
            Source::Absent => SearchAttributes::new(),
        };
        if self.config.scope_to_target {
            attrs.push(Search::exact_type(target.name()));
        }
        Ok(attrs)
    }

    fn create<S: Store + ?Sized>(
        &self,
        store: &S,
        ctx: &SecurityContext,
        target: &EntityType,
    ) -> Result<Option<Entity>> {
        run_in_transaction(store, ctx, |tx| {
            let mut attrs = PropertyMap::new();
            attrs.insert(TYPE_KEY.to_string(), Value::from(target.name()));

            match store.create_entity(tx, target.name(), attrs)? {
                Some(entity) => {
                    debug!(type_name = target.name(), id = %entity.id, "created entity for absent reference");
                    Ok(Some(entity))
                }
                None => {
                    warn!(
                        type_name = target.name(),
                        property = self.property_name().unwrap_or("<none>"),
                        "unable to create entity"
                    );
                    match self.config.on_creation_failure {
                        MatchPolicy::Lenient => Ok(None),
                        MatchPolicy::Strict => Err(Error::CreationFailed {
                            type_name: target.name().to_string(),
                            property: self.property_name().map(str::to_owned),
                        }),
                    }
                }
            }
        })
    }
}

impl DeserializationStrategy for IdDeserializationStrategy {
    fn resolve<S: Store + ?Sized>(
        &self,
        store: &S,
        ctx: &SecurityContext,
        target: &EntityType,
        source: Source,
    ) -> Result<Option<Entity>> {
        if matches!(source, Source::Absent) {
            return if self.config.create_if_not_existing {
                self.create(store, ctx, target)
            } else {
                Ok(None)
            };
        }

        let attrs = self.predicates(target, &source)?;
        let results = search::execute(store, ctx, &attrs)?;

        match results.len() {
            0 => Err(Error::EntityNotFound {
                type_name: target.name().to_string(),
                value: source.describe(),
            }),
            1 => Ok(results.into_iter().next()),
            count => {
                warn!(
                    type_name = target.name(),
                    value = %source.describe(),
                    count,
                    "more than one result; either this is not an identifier or there is a collision"
                );
                match self.config.on_ambiguous {
                    MatchPolicy::Lenient => Ok(None),
                    MatchPolicy::Strict => Err(Error::AmbiguousMatch {
                        type_name: target.name().to_string(),
                        value: source.describe(),
                        count,
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io;
    use std::sync::Arc;

    /// Collects formatted log lines emitted while `f` runs.
    #[derive(Clone, Default)]
    struct LogCapture(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::WARN)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8_lossy(&capture.0.lock()).into_owned();
        (out, logs)
    }

    fn person() -> EntityType {
        EntityType::new("Person", [PropertyKey::string("name"), PropertyKey::integer("age")]).unwrap()
    }

    fn ctx() -> SecurityContext {
        SecurityContext::superuser()
    }

    fn seed(store: &MemoryStore, name: &str, age: i64) -> Entity {
        run_in_transaction(store, &ctx(), |tx| {
            let mut props = PropertyMap::new();
            props.insert(TYPE_KEY.into(), Value::from("Person"));
            props.insert("name".into(), Value::from(name));
            props.insert("age".into(), Value::from(age));
            store.create_entity(tx, "Person", props)
        })
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_scalar_resolves_identifier() {
        let store = MemoryStore::new();
        let ada = seed(&store, "Ada", 36);
        let strategy = IdDeserializationStrategy::default();

        let found = strategy.resolve(&store, &ctx(), &person(), Source::from(ada.id.as_str())).unwrap();
        assert_eq!(found, Some(ada));
    }

    #[test]
    fn test_scalar_unknown_identifier_is_not_found() {
        let store = MemoryStore::new();
        seed(&store, "Ada", 36);
        let strategy = IdDeserializationStrategy::default();

        let err = strategy.resolve(&store, &ctx(), &person(), Source::from("missing")).unwrap_err();
        match err {
            Error::EntityNotFound { type_name, value } => {
                assert_eq!(type_name, "Person");
                assert_eq!(value, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_string_scalar_uses_string_form() {
        let store = MemoryStore::new();
        let strategy = IdDeserializationStrategy::default();
        let err = strategy.resolve(&store, &ctx(), &person(), Source::from(json!(17))).unwrap_err();
        assert!(matches!(err, Error::EntityNotFound { ref value, .. } if value == "17"));
    }

    #[test]
    fn test_structured_conversion_failure_propagates() {
        let store = MemoryStore::new();
        let strategy = IdDeserializationStrategy::default();
        let err = strategy
            .resolve(&store, &ctx(), &person(), Source::from(json!({"age": "very"})))
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { ref key, ref value, .. } if key == "age" && value == "\"very\""));
    }

    #[test]
    fn test_null_structured_entry_is_rejected() {
        let store = MemoryStore::new();
        seed(&store, "Ada", 36);
        let strategy = IdDeserializationStrategy::default();
        let err = strategy
            .resolve(&store, &ctx(), &person(), Source::from(json!({"name": "Ada", "age": null})))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Conversion { ref key, ref value, .. } if key == "age" && value == "null"
        ));
    }

    #[test]
    fn test_scope_to_target_type() {
        let store = MemoryStore::new();
        let ada = seed(&store, "Ada", 36);
        run_in_transaction(&store, &ctx(), |tx| {
            let mut props = PropertyMap::new();
            props.insert(TYPE_KEY.into(), Value::from("Robot"));
            props.insert("name".into(), Value::from("Ada"));
            store.create_entity(tx, "Robot", props)
        })
        .unwrap();
        let robot = EntityType::new("Robot", [PropertyKey::string("name")]).unwrap();

        // Unscoped: any type may answer
        let unscoped = IdDeserializationStrategy::default();
        assert!(!unscoped.config().scope_to_target);
        let found = unscoped.resolve(&store, &ctx(), &robot, Source::from(ada.id.as_str())).unwrap();
        assert_eq!(found.map(|e| e.type_name), Some("Person".to_string()));
        assert_eq!(unscoped.resolve(&store, &ctx(), &person(), Source::from(json!({"name": "Ada"}))).unwrap(), None);

        let scoped = IdDeserializationStrategy::with_config(
            None,
            ResolverConfig { scope_to_target: true, ..ResolverConfig::default() },
        );
        let err = scoped.resolve(&store, &ctx(), &robot, Source::from(ada.id.as_str())).unwrap_err();
        assert!(matches!(err, Error::EntityNotFound { .. }));
        let found = scoped.resolve(&store, &ctx(), &person(), Source::from(json!({"name": "Ada"}))).unwrap();
        assert_eq!(found, Some(ada));
    }

    #[test]
    fn test_absent_without_create_is_none_and_no_write() {
        let store = MemoryStore::new();
        let strategy = IdDeserializationStrategy::new(None, false);
        assert_eq!(strategy.resolve(&store, &ctx(), &person(), Source::Absent).unwrap(), None);
        assert_eq!(store.entity_count(&ctx()).unwrap(), 0);
    }

    #[test]
    fn test_absent_with_create_commits_typed_entity() {
        let store = MemoryStore::new();
        let strategy = IdDeserializationStrategy::new(Some(PropertyKey::string("owner")), true);
        let created = strategy.resolve(&store, &ctx(), &person(), Source::Absent).unwrap().unwrap();

        assert_eq!(created.type_name, "Person");
        assert_eq!(created.get(TYPE_KEY), Some(&Value::from("Person")));
        assert_eq!(store.get_entity(&ctx(), &created.id).unwrap(), Some(created));
    }

    #[test]
    fn test_declined_creation_policies() {
        let store = MemoryStore::with_creatable_types(["Folder"]);

        let lenient = IdDeserializationStrategy::new(Some(PropertyKey::string("owner")), true);
        let (found, logs) = capture_logs(|| lenient.resolve(&store, &ctx(), &person(), Source::Absent));
        assert_eq!(found.unwrap(), None);
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("unable to create entity"), "{logs}");
        assert!(logs.contains(r#"type_name="Person""#), "{logs}");
        assert!(logs.contains(r#"property="owner""#), "{logs}");

        let strict = IdDeserializationStrategy::with_config(
            Some(PropertyKey::string("owner")),
            ResolverConfig::strict(true),
        );
        let err = strict.resolve(&store, &ctx(), &person(), Source::Absent).unwrap_err();
        assert!(matches!(
            err,
            Error::CreationFailed { ref type_name, property: Some(ref p) } if type_name == "Person" && p == "owner"
        ));
        assert_eq!(store.entity_count(&ctx()).unwrap(), 0);
    }

    #[test]
    fn test_ambiguous_policies() {
        let store = MemoryStore::new();
        seed(&store, "Ada", 36);
        seed(&store, "Ada", 40);
        let source = Source::from(json!({"name": "Ada"}));

        let lenient = IdDeserializationStrategy::default();
        let (found, logs) = capture_logs(|| lenient.resolve(&store, &ctx(), &person(), source.clone()));
        assert_eq!(found.unwrap(), None);
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("more than one result"), "{logs}");
        assert!(logs.contains(r#"type_name="Person""#), "{logs}");
        assert!(logs.contains(r#"value={"name":"Ada"}"#), "{logs}");
        assert!(logs.contains("count=2"), "{logs}");

        let strict = IdDeserializationStrategy::with_config(None, ResolverConfig::strict(false));
        let err = strict.resolve(&store, &ctx(), &person(), source).unwrap_err();
        assert!(matches!(err, Error::AmbiguousMatch { count: 2, .. }));
    }
}
