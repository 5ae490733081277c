use anyhow::Result;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{app_user, db, errors::ModelError};

fn db_available() -> bool {
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

#[tokio::test]
async fn app_user_create_and_find() -> Result<()> {
    if !db_available() { return Ok(()); }
    let db = db::connect().await?;
    db::migrate(&db).await?;

    let username = format!("model_user_{}", Uuid::new_v4());
    let created = app_user::create(&db, &username, "$argon2id$stub".into()).await?;
    assert_eq!(created.username, username);

    let found = app_user::find_by_username(&db, &username).await?.unwrap();
    assert_eq!(found.id, created.id);
    assert!(app_user::find_by_username(&db, "definitely-missing-user").await?.is_none());

    app_user::Entity::delete_by_id(created.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_conflict() -> Result<()> {
    if !db_available() { return Ok(()); }
    let db = db::connect().await?;
    db::migrate(&db).await?;

    let username = format!("dup_user_{}", Uuid::new_v4());
    let first = app_user::create(&db, &username, "$argon2id$a".into()).await?;
    let second = app_user::create(&db, &username, "$argon2id$b".into()).await;
    assert!(matches!(second, Err(ModelError::Conflict(_))), "got {second:?}");

    app_user::Entity::delete_by_id(first.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn empty_hash_rejected_before_insert() -> Result<()> {
    if !db_available() { return Ok(()); }
    let db = db::connect().await?;
    let res = app_user::create(&db, "whoever", "  ".into()).await;
    assert!(matches!(res, Err(ModelError::Validation(_))));
    Ok(())
}
