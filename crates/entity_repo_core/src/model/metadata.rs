//! Entity metadata contract and the default in-memory implementation.
//!
//! # Responsibility
//! - Describe which fields and associations an entity type declares.
//! - Map declared names onto storage columns.
//!
//! # Invariants
//! - Metadata is immutable once handed to a repository.
//! - Field names are case-sensitive; `resolve_field` is the only place that
//!   tolerates casing differences.

/// Capability interface over entity metadata.
pub trait EntityMetadata {
    /// Fully qualified entity name, e.g. `App\Entity\User`.
    fn name(&self) -> &str;

    /// Backing table name.
    fn table_name(&self) -> &str;

    /// Identifier field name.
    fn identifier(&self) -> &str;

    fn has_field(&self, field: &str) -> bool;

    fn has_association(&self, field: &str) -> bool;

    /// Storage column for a declared field or association.
    fn column_name(&self, field: &str) -> Option<&str>;

    /// All declared field and association names.
    fn declared_names(&self) -> Vec<&str>;

    /// Normalizes a method-name suffix (`EmailAddress`) to declared casing.
    ///
    /// Tries an exact match, then the lower-first form, then a
    /// case-insensitive match. Falls back to the lower-first form, which the
    /// caller validates with `has_field`/`has_association`.
    fn resolve_field(&self, name: &str) -> String {
        let lower_first = lower_first(name);
        let declared = self.declared_names();

        if declared.iter().any(|candidate| *candidate == name) {
            return name.to_string();
        }
        if declared.iter().any(|candidate| *candidate == lower_first) {
            return lower_first;
        }
        declared
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|candidate| candidate.to_string())
            .unwrap_or(lower_first)
    }
}

impl<T: EntityMetadata + ?Sized> EntityMetadata for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn table_name(&self) -> &str {
        (**self).table_name()
    }

    fn identifier(&self) -> &str {
        (**self).identifier()
    }

    fn has_field(&self, field: &str) -> bool {
        (**self).has_field(field)
    }

    fn has_association(&self, field: &str) -> bool {
        (**self).has_association(field)
    }

    fn column_name(&self, field: &str) -> Option<&str> {
        (**self).column_name(field)
    }

    fn declared_names(&self) -> Vec<&str> {
        (**self).declared_names()
    }

    fn resolve_field(&self, name: &str) -> String {
        (**self).resolve_field(name)
    }
}

const DEFAULT_IDENTIFIER: &str = "id";

/// Association mapping: field name plus owning join column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationMapping {
    pub field: String,
    pub join_column: String,
}

/// Default metadata implementation, built fluently or reflected from SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    name: String,
    table: String,
    identifier: String,
    // Set while `identifier` is the implicit default not yet declared by
    // the caller.
    implicit_identifier: bool,
    fields: Vec<String>,
    associations: Vec<AssociationMapping>,
}

impl ClassMetadata {
    /// Creates metadata whose only field is the default `id` identifier.
    ///
    /// The table name defaults to the last `\`-separated segment of `name`,
    /// lowercased. A later `with_identifier` replaces the default `id` field
    /// unless it was declared explicitly with `with_field`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table = name
            .rsplit('\\')
            .next()
            .unwrap_or(name.as_str())
            .to_ascii_lowercase();
        Self {
            name,
            table,
            identifier: DEFAULT_IDENTIFIER.to_string(),
            implicit_identifier: true,
            fields: vec![DEFAULT_IDENTIFIER.to_string()],
            associations: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Declares the identifier field; it is also registered as a field.
    pub fn with_identifier(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if self.implicit_identifier {
            let previous = std::mem::take(&mut self.identifier);
            self.fields.retain(|candidate| *candidate != previous);
            self.implicit_identifier = false;
        }
        if !self.fields.contains(&field) {
            self.fields.push(field.clone());
        }
        self.identifier = field;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if field == self.identifier {
            self.implicit_identifier = false;
        }
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
        self
    }

    /// Declares an association stored in `join_column`.
    pub fn with_association(
        mut self,
        field: impl Into<String>,
        join_column: impl Into<String>,
    ) -> Self {
        let field = field.into();
        self.associations.retain(|mapping| mapping.field != field);
        self.associations.push(AssociationMapping {
            field,
            join_column: join_column.into(),
        });
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn associations(&self) -> &[AssociationMapping] {
        &self.associations
    }
}

impl EntityMetadata for ClassMetadata {
    fn name(&self) -> &str {
        &self.name
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|candidate| candidate == field)
    }

    fn has_association(&self, field: &str) -> bool {
        self.associations
            .iter()
            .any(|mapping| mapping.field == field)
    }

    fn column_name(&self, field: &str) -> Option<&str> {
        if let Some(column) = self.fields.iter().find(|candidate| *candidate == field) {
            return Some(column.as_str());
        }
        self.associations
            .iter()
            .find(|mapping| mapping.field == field)
            .map(|mapping| mapping.join_column.as_str())
    }

    fn declared_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(String::as_str)
            .chain(self.associations.iter().map(|mapping| mapping.field.as_str()))
            .collect()
    }
}

fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
