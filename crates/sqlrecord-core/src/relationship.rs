//! Relationship metadata attached to record fields.
//!
//! The create pipeline only acts on belongs-to relationships: their
//! foreign-key columns live on the record being inserted. The other kinds are
//! carried so the reflection layer can describe a record completely.

/// The type of relationship between two records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationshipKind {
    /// One-to-one: `User` has one `Profile`.
    HasOne,
    /// Many-to-one: many `User`s belong to one `Company`.
    #[default]
    BelongsTo,
    /// One-to-many: one `User` has many `Email`s.
    HasMany,
    /// Many-to-many via a link table.
    ManyToMany,
}

impl RelationshipKind {
    /// Snake-case name, as used in log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::HasOne => "has_one",
            RelationshipKind::BelongsTo => "belongs_to",
            RelationshipKind::HasMany => "has_many",
            RelationshipKind::ManyToMany => "many_to_many",
        }
    }
}

/// Metadata about a relationship field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipInfo {
    /// The related record's table name.
    pub related_table: &'static str,

    /// Kind of relationship.
    pub kind: RelationshipKind,

    /// Foreign-key fields on *this* record (belongs-to), by field name or
    /// column name. e.g. `["company_id"]` on `User`.
    pub foreign_keys: &'static [&'static str],
}

impl RelationshipInfo {
    /// Create a relationship with no foreign keys.
    #[must_use]
    pub const fn new(related_table: &'static str, kind: RelationshipKind) -> Self {
        Self {
            related_table,
            kind,
            foreign_keys: &[],
        }
    }

    /// Shorthand for a belongs-to relationship with its foreign-key fields.
    #[must_use]
    pub const fn belongs_to(related_table: &'static str, foreign_keys: &'static [&'static str]) -> Self {
        Self {
            related_table,
            kind: RelationshipKind::BelongsTo,
            foreign_keys,
        }
    }

    /// Set the foreign-key fields.
    #[must_use]
    pub const fn foreign_keys(mut self, keys: &'static [&'static str]) -> Self {
        self.foreign_keys = keys;
        self
    }

    /// Whether this record owns the foreign keys.
    pub const fn is_belongs_to(&self) -> bool {
        matches!(self.kind, RelationshipKind::BelongsTo)
    }
}
