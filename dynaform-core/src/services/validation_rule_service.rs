use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::entities::{columns, forms, validation_kinds, validation_rules};
use crate::errors::{SchemaError, SchemaResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    pub validation_kind_id: i32,
    pub form_id: i32,
    pub column_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleView {
    pub id: i32,
    pub validation_kind_id: i32,
    pub validation_name: String,
    pub form_id: i32,
    pub form_name: String,
    pub column_id: i32,
    pub column_name: String,
}

#[derive(Clone)]
pub struct ValidationRuleService {
    db: DatabaseConnection,
}

impl ValidationRuleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_kinds(&self) -> SchemaResult<Vec<validation_kinds::Model>> {
        Ok(validation_kinds::Entity::find()
            .order_by_asc(validation_kinds::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn add_rule(
        &self,
        owner_id: i32,
        draft: RuleDraft,
    ) -> SchemaResult<validation_rules::Model> {
        validation_kinds::Entity::find_by_id(draft.validation_kind_id)
            .one(&self.db)
            .await?
            .ok_or(SchemaError::ValidationKindNotFound(draft.validation_kind_id))?;
        self.owned_form(owner_id, draft.form_id).await?;
        columns::Entity::find_by_id(draft.column_id)
            .filter(columns::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::ColumnNotFound(draft.column_id))?;

        let rule = validation_rules::ActiveModel {
            validation_kind_id: Set(draft.validation_kind_id),
            form_id: Set(draft.form_id),
            column_id: Set(draft.column_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(
            "Added validation {} to column {} of form {}",
            rule.validation_kind_id, rule.column_id, rule.form_id
        );
        Ok(rule)
    }

    /// Active rules of a form with their kind, form and column names.
    pub async fn rules_for_form(&self, owner_id: i32, form_id: i32) -> SchemaResult<Vec<RuleView>> {
        let form = self.owned_form(owner_id, form_id).await?;

        let rules = validation_rules::Entity::find()
            .filter(validation_rules::Column::FormId.eq(form_id))
            .filter(validation_rules::Column::IsActive.eq(true))
            .order_by_asc(validation_rules::Column::Id)
            .find_also_related(validation_kinds::Entity)
            .all(&self.db)
            .await?;

        let column_names: HashMap<i32, String> = columns::Entity::find()
            .filter(
                columns::Column::Id.is_in(rules.iter().map(|(r, _)| r.column_id).collect::<Vec<_>>()),
            )
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(rules
            .into_iter()
            .filter_map(|(rule, kind)| {
                let kind = kind?;
                Some(RuleView {
                    id: rule.id,
                    validation_kind_id: kind.id,
                    validation_name: kind.name,
                    form_id: rule.form_id,
                    form_name: form.name.clone(),
                    column_id: rule.column_id,
                    column_name: column_names.get(&rule.column_id).cloned().unwrap_or_default(),
                })
            })
            .collect())
    }

    pub async fn update_rule(
        &self,
        owner_id: i32,
        rule_id: i32,
        validation_kind_id: i32,
        is_active: bool,
    ) -> SchemaResult<validation_rules::Model> {
        validation_kinds::Entity::find_by_id(validation_kind_id)
            .one(&self.db)
            .await?
            .ok_or(SchemaError::ValidationKindNotFound(validation_kind_id))?;
        let rule = self.get_rule(owner_id, rule_id).await?;

        let mut active: validation_rules::ActiveModel = rule.into();
        active.validation_kind_id = Set(validation_kind_id);
        active.is_active = Set(is_active);
        Ok(active.update(&self.db).await?)
    }

    pub async fn soft_delete_rule(&self, owner_id: i32, rule_id: i32) -> SchemaResult<()> {
        self.get_rule(owner_id, rule_id).await?;
        validation_rules::Entity::update_many()
            .col_expr(
                validation_rules::Column::IsActive,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(validation_rules::Column::Id.eq(rule_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// A rule on one of the owner's forms; rules on other owners' forms are not found.
    pub async fn get_rule(&self, owner_id: i32, rule_id: i32) -> SchemaResult<validation_rules::Model> {
        let rule = validation_rules::Entity::find_by_id(rule_id)
            .one(&self.db)
            .await?
            .ok_or(SchemaError::RuleNotFound(rule_id))?;
        self.owned_form(owner_id, rule.form_id).await.map_err(|e| {
            if e.is_not_found() {
                SchemaError::RuleNotFound(rule_id)
            } else {
                e
            }
        })?;
        Ok(rule)
    }

    async fn owned_form(&self, owner_id: i32, form_id: i32) -> SchemaResult<forms::Model> {
        forms::Entity::find_by_id(form_id)
            .filter(forms::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::FormNotFound(form_id))
    }
}
