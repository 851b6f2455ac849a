use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::employee;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Employee {
    pub id: Uuid,
    pub employee_id: String,
    pub full_name: String,
    pub nick_name: Option<String>,
}

impl Employee {
    fn from_model(model: employee::Model) -> Self {
        Self {
            id: model.uuid,
            employee_id: model.employee_id,
            full_name: model.full_name,
            nick_name: model.nick_name,
        }
    }

    /// First token of the full name, with the nickname in parentheses
    /// when one is on file.
    pub fn display_name(&self) -> String {
        let first = self
            .full_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.full_name);
        match &self.nick_name {
            Some(nick) => format!("{} ({})", first, nick),
            None => first.to_string(),
        }
    }

    pub async fn find_by_employee_id<C: ConnectionTrait>(
        db: &C,
        employee_id: &str,
    ) -> Result<Option<Employee>, DbErr> {
        Ok(employee::Entity::find()
            .filter(employee::Column::EmployeeId.eq(employee_id))
            .one(db)
            .await?
            .map(Self::from_model))
    }

    /// Which of `employee_ids` do not exist. Used to reject an
    /// assignment referencing unknown codes in a single query.
    pub async fn find_missing<C: ConnectionTrait>(
        db: &C,
        employee_ids: &[&str],
    ) -> Result<Vec<String>, DbErr> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<String> = employee::Entity::find()
            .filter(employee::Column::EmployeeId.is_in(employee_ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.employee_id)
            .collect();
        Ok(employee_ids
            .iter()
            .filter(|id| !found.iter().any(|f| f == *id))
            .map(|id| id.to_string())
            .collect())
    }

    /// employee_id -> display name, for decorating history rows.
    pub async fn display_names<C: ConnectionTrait>(
        db: &C,
        employee_ids: &[&str],
    ) -> Result<HashMap<String, String>, DbErr> {
        if employee_ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(employee::Entity::find()
            .filter(employee::Column::EmployeeId.is_in(employee_ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|m| {
                let e = Self::from_model(m);
                (e.employee_id.clone(), e.display_name())
            })
            .collect())
    }
}
