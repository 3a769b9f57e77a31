//! Post-query filters.
//!
//! A `Filter` decides inclusion per entity after the store has answered a
//! search, which lets it use context the store's predicate language cannot
//! see (the caller's capabilities, for instance). A filter may carry a
//! comparator; the filtered output is then sorted by it, otherwise the
//! search order is kept.

use std::cmp::Ordering;

use crate::model::{Entity, SecurityContext, Value};
use crate::property::{PropertyKey, PropertyMetadata, SortType};
use crate::search::ResultSet;

/// Total order over entities.
pub trait EntityComparator: Send + Sync {
    fn compare(&self, a: &Entity, b: &Entity) -> Ordering;
}

impl<F> EntityComparator for F
where
    F: Fn(&Entity, &Entity) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        self(a, b)
    }
}

/// Inclusion rule plus optional ordering.
pub trait Filter {
    fn include_in_result_set(&self, ctx: &SecurityContext, entity: &Entity) -> bool;

    fn comparator(&self) -> Option<&dyn EntityComparator> {
        None
    }
}

/// Keep the entities `filter` accepts, ordered by its comparator if it has one.
pub fn apply<F: Filter + ?Sized>(filter: &F, ctx: &SecurityContext, results: ResultSet) -> ResultSet {
    let mut kept: Vec<Entity> = results
        .into_iter()
        .filter(|e| filter.include_in_result_set(ctx, e))
        .collect();
    if let Some(cmp) = filter.comparator() {
        kept.sort_by(|a, b| cmp.compare(a, b));
    }
    ResultSet::new(kept)
}

impl ResultSet {
    pub fn filter<F: Filter + ?Sized>(self, ctx: &SecurityContext, filter: &F) -> ResultSet {
        apply(filter, ctx, self)
    }
}

// ============================================================================
// PredicateFilter
// ============================================================================

/// Closure-backed filter.
pub struct PredicateFilter<P> {
    predicate: P,
    comparator: Option<Box<dyn EntityComparator>>,
}

impl<P> PredicateFilter<P>
where
    P: Fn(&SecurityContext, &Entity) -> bool,
{
    pub fn new(predicate: P) -> Self {
        Self { predicate, comparator: None }
    }

    pub fn with_comparator(mut self, comparator: impl EntityComparator + 'static) -> Self {
        self.set_comparator(comparator);
        self
    }

    pub fn set_comparator(&mut self, comparator: impl EntityComparator + 'static) {
        self.comparator = Some(Box::new(comparator));
    }
}

impl<P> Filter for PredicateFilter<P>
where
    P: Fn(&SecurityContext, &Entity) -> bool,
{
    fn include_in_result_set(&self, ctx: &SecurityContext, entity: &Entity) -> bool {
        (self.predicate)(ctx, entity)
    }

    fn comparator(&self) -> Option<&dyn EntityComparator> {
        self.comparator.as_deref()
    }
}

// ============================================================================
// VisibilityFilter
// ============================================================================

/// Property naming the principal that owns an entity.
pub const OWNER_KEY: &str = "owner";
/// Boolean property marking an entity visible to everyone.
pub const PUBLIC_KEY: &str = "visibleToPublicUsers";

/// Includes what the caller may see: everything for a superuser, otherwise
/// public entities and entities the caller's principal owns.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityFilter;

impl Filter for VisibilityFilter {
    fn include_in_result_set(&self, ctx: &SecurityContext, entity: &Entity) -> bool {
        if ctx.is_superuser() {
            return true;
        }
        if entity.get(PUBLIC_KEY).and_then(Value::as_bool).unwrap_or(false) {
            return true;
        }
        match (ctx.principal(), entity.get(OWNER_KEY).and_then(Value::as_str)) {
            (Some(principal), Some(owner)) => principal == owner,
            _ => false,
        }
    }
}

// ============================================================================
// PropertyComparator
// ============================================================================

/// Orders entities by one stored property.
///
/// A string sort hint compares every value by its plain string form. Other
/// hints compare by type class first, then numerically or lexically within
/// the class, so legacy values that failed to normalize still order
/// consistently. Missing values sort last in either direction, and the
/// entity id breaks ties so the order is total.
#[derive(Debug, Clone)]
pub struct PropertyComparator {
    key: PropertyKey,
    descending: bool,
}

impl PropertyComparator {
    pub fn ascending(key: PropertyKey) -> Self {
        Self { key, descending: false }
    }

    pub fn descending(key: PropertyKey) -> Self {
        Self { key, descending: true }
    }

    fn sort_value(&self, entity: &Entity) -> Option<Value> {
        let stored = entity.get(self.key.name())?;
        match self.key.fix_database_property(stored)? {
            Value::Null => None,
            v => Some(v),
        }
    }

    fn compare_values(&self, a: &Value, b: &Value) -> Ordering {
        if self.key.sort_type() == Some(SortType::String) {
            return a.to_plain_string().cmp(&b.to_plain_string());
        }
        type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
            (Value::Entity(x), Value::Entity(y)) => x.id.cmp(&y.id),
            _ => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.to_plain_string().cmp(&b.to_plain_string()),
            },
        })
    }
}

/// Mixed-type values order numbers first, then strings, then everything else.
fn type_rank(value: &Value) -> u8 {
    match value {
        v if v.is_numeric() => 0,
        v if v.is_string() => 1,
        Value::Bool(_) => 2,
        Value::DateTime(_) => 3,
        Value::Entity(_) => 4,
        _ => 5,
    }
}

impl EntityComparator for PropertyComparator {
    fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let by_value = match (self.sort_value(a), self.sort_value(b)) {
            (Some(x), Some(y)) => {
                let ord = self.compare_values(&x, &y);
                if self.descending { ord.reverse() } else { ord }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_value.then_with(|| a.id.cmp(&b.id))
    }
}
