use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::work_assignment;

pub async fn work_assignment_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    work_assignment::Entity::find()
        .select_only()
        .column(work_assignment::Column::Id)
        .filter(work_assignment::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn work_assignment_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    work_assignment::Entity::find()
        .select_only()
        .column(work_assignment::Column::Uuid)
        .filter(work_assignment::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}
