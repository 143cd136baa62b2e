use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::debug;

use crate::database::entities::{
    column_options, columns, form_details, forms, validation_kinds, validation_rules,
};
use crate::errors::{SchemaError, SchemaResult};
use crate::form_types::{minor_to_decimal, ColumnDescriptor, FormSchema, OptionKind, RuleKind};
use crate::services::FormService;

/// Builds the ordered column schema of a form from its stored definition.
#[derive(Clone)]
pub struct SchemaAssembler {
    db: DatabaseConnection,
}

impl SchemaAssembler {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Ordered columns of an active form, optionally narrowed to one section.
    /// Empty when the form is missing, inactive, expired or has no active bindings.
    pub async fn assemble(
        &self,
        form_id: i32,
        form_no: Option<i32>,
    ) -> SchemaResult<Vec<ColumnDescriptor>> {
        Ok(Self::load(&self.db, form_id, form_no)
            .await?
            .map(|schema| schema.columns)
            .unwrap_or_default())
    }

    /// Full schema with form metadata; a missing or closed form is an error here.
    pub async fn schema(&self, form_id: i32, form_no: Option<i32>) -> SchemaResult<FormSchema> {
        Self::load(&self.db, form_id, form_no)
            .await?
            .ok_or(SchemaError::FormNotFound(form_id))
    }

    pub async fn form_exists(&self, form_id: i32) -> SchemaResult<bool> {
        Ok(FormService::find_active_form(&self.db, form_id).await?.is_some())
    }

    /// Assemble on any connection, including an open transaction.
    pub async fn load<C: ConnectionTrait>(
        conn: &C,
        form_id: i32,
        form_no: Option<i32>,
    ) -> Result<Option<FormSchema>, DbErr> {
        let Some(form) = FormService::find_active_form(conn, form_id).await? else {
            return Ok(None);
        };
        Ok(Some(Self::build(conn, form, form_no).await?))
    }

    /// Schema of a form regardless of its active flag or end date, for reading
    /// back stored submissions.
    pub async fn load_any<C: ConnectionTrait>(
        conn: &C,
        form_id: i32,
    ) -> Result<Option<FormSchema>, DbErr> {
        let Some(form) = forms::Entity::find_by_id(form_id).one(conn).await? else {
            return Ok(None);
        };
        Ok(Some(Self::build(conn, form, None).await?))
    }

    async fn build<C: ConnectionTrait>(
        conn: &C,
        form: forms::Model,
        form_no: Option<i32>,
    ) -> Result<FormSchema, DbErr> {
        let form_id = form.id;
        let mut query = form_details::Entity::find()
            .filter(form_details::Column::FormId.eq(form_id))
            .filter(form_details::Column::IsActive.eq(true));
        if let Some(form_no) = form_no {
            query = query.filter(form_details::Column::FormNo.eq(form_no));
        }
        let bound: Vec<(form_details::Model, columns::Model)> = query
            .order_by_asc(form_details::Column::FormNo)
            .order_by_asc(form_details::Column::SequenceNo)
            .order_by_asc(form_details::Column::Id)
            .find_also_related(columns::Entity)
            .all(conn)
            .await?
            .into_iter()
            .filter_map(|(binding, column)| column.filter(|c| c.is_active).map(|c| (binding, c)))
            .collect();

        let column_ids: Vec<i32> = bound.iter().map(|(_, c)| c.id).collect();
        let mut options: HashMap<(i32, String), Vec<String>> = HashMap::new();
        if !column_ids.is_empty() {
            for option in column_options::Entity::find()
                .filter(column_options::Column::FormId.eq(form_id))
                .filter(column_options::Column::ColumnId.is_in(column_ids.clone()))
                .filter(column_options::Column::IsActive.eq(true))
                .order_by_asc(column_options::Column::Id)
                .all(conn)
                .await?
            {
                options
                    .entry((option.column_id, option.option_kind.to_ascii_lowercase()))
                    .or_default()
                    .push(option.label);
            }
        }

        let mut rules: HashMap<i32, Vec<RuleKind>> = HashMap::new();
        for (rule, kind) in validation_rules::Entity::find()
            .filter(validation_rules::Column::FormId.eq(form_id))
            .filter(validation_rules::Column::IsActive.eq(true))
            .find_also_related(validation_kinds::Entity)
            .all(conn)
            .await?
        {
            if let Some(kind) = kind.and_then(|k| RuleKind::parse(&k.name)) {
                let entry = rules.entry(rule.column_id).or_default();
                if !entry.contains(&kind) {
                    entry.push(kind);
                }
            }
        }

        let mut descriptors: Vec<ColumnDescriptor> = bound
            .into_iter()
            .map(|(binding, column)| {
                let data_type = column.kind();
                let option_values = data_type
                    .option_kind()
                    .map(|kind: OptionKind| {
                        options
                            .get(&(column.id, kind.as_str().to_string()))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .unwrap_or_default();
                let validations = rules.get(&column.id).cloned().unwrap_or_default();

                ColumnDescriptor {
                    col_id: column.id,
                    binding_id: binding.id,
                    column_name: column.name,
                    data_type,
                    sequence_no: binding.sequence_no,
                    form_no: binding.form_no,
                    read_only: binding.is_read_only,
                    required: validations.contains(&RuleKind::Required),
                    validations,
                    option_values,
                }
            })
            .collect();
        descriptors.sort_by_key(|d| (d.form_no, d.sequence_no, d.binding_id));

        debug!(
            "Assembled form {} ({:?}) with {} columns",
            form_id,
            form_no,
            descriptors.len()
        );

        Ok(FormSchema {
            form_id: form.id,
            fee: minor_to_decimal(form.fee()),
            form_name: form.name,
            columns: descriptors,
        })
    }
}
