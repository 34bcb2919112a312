use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection as SeaOrmDatabaseConnection,
    DbErr, EntityTrait, Schema,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::entities::{GalleryEntity, ImageEntity, UserEntity};

/// 共享的连接池句柄，显式传给每个服务方法
pub type DatabaseConnection = Arc<SeaOrmDatabaseConnection>;

/// MySQL 默认 8 小时断开空闲连接，连接寿命要短于它
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(7 * 3600);

pub async fn establish_connection(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.as_str());
    options
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .max_lifetime(MAX_CONNECTION_LIFETIME)
        .sqlx_logging(false);

    tracing::info!(
        "连接数据库: 连接池 {}~{}",
        config.min_connections,
        config.max_connections
    );

    let db = Database::connect(options).await?;
    match db.ping().await {
        Ok(()) => tracing::info!("数据库连接正常 ({:?})", db.get_database_backend()),
        Err(e) => tracing::warn!("⚠️  数据库 ping 失败: {}", e),
    }

    Ok(Arc::new(db))
}

/// 按实体定义建表（已存在则跳过），用于本地开发和测试
pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_table(db, UserEntity).await?;
    create_table(db, GalleryEntity).await?;
    create_table(db, ImageEntity).await?;
    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();

    db.execute(backend.build(&stmt)).await?;
    tracing::debug!("数据表就绪: {}", entity.table_name());
    Ok(())
}
