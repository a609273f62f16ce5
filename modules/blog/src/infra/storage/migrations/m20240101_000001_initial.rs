use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

use crate::infra::storage::entity::{comment, member, post, profile, project, user};

#[derive(DeriveMigrationName)]
pub struct Migration;

const POST_NUMBER_INDEX: &str = "ux_posts_project_number";
const MEMBER_PROJECT_INDEX: &str = "idx_members_project_id";

async fn create_from_entity<E>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await?;
    for mut index in schema.create_index_from_entity(entity) {
        manager.create_index(index.if_not_exists().to_owned()).await?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        create_from_entity(manager, &schema, user::Entity).await?;
        create_from_entity(manager, &schema, profile::Entity).await?;
        create_from_entity(manager, &schema, project::Entity).await?;
        create_from_entity(manager, &schema, member::Entity).await?;
        create_from_entity(manager, &schema, post::Entity).await?;
        create_from_entity(manager, &schema, comment::Entity).await?;

        // Backstop for per-project post numbering.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(POST_NUMBER_INDEX)
                    .table(post::Entity)
                    .col(post::Column::ProjectId)
                    .col(post::Column::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(MEMBER_PROJECT_INDEX)
                    .table(member::Entity)
                    .col(member::Column::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(comment::Entity).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(post::Entity).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(member::Entity).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(project::Entity).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(profile::Entity).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(user::Entity).if_exists().to_owned())
            .await
    }
}
