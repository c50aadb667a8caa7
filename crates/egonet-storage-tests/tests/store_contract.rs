//! The same store contract, checked against every enabled backend

#[cfg(feature = "sqlite")]
mod sqlite {
    use egonet_sqlite::{RelationalIngestor, SqliteConfig};
    use egonet_storage_tests::*;

    fn open(batch_size: usize) -> RelationalIngestor {
        RelationalIngestor::open(SqliteConfig::memory(), batch_size).unwrap()
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        check_reimport_is_idempotent(&open(3)).await;
    }

    #[tokio::test]
    async fn test_wipe_then_reimport() {
        check_wipe_then_reimport(&open(10)).await;
    }

    #[tokio::test]
    async fn test_chunk_size_independence() {
        let build = |n: usize| async move { open(n) };
        let small = contents_for_batch_size(build, 1, &RELATIONAL_DUMP).await;
        let medium = contents_for_batch_size(build, 100, &RELATIONAL_DUMP).await;
        let large = contents_for_batch_size(build, 50_000, &RELATIONAL_DUMP).await;
        assert_eq!(small, medium);
        assert_eq!(medium, large);
    }
}

#[cfg(feature = "surrealdb")]
mod surrealdb {
    use egonet_storage_tests::*;
    use egonet_surrealdb::{GraphIngestor, SurrealDbConfig};

    async fn open(batch_size: usize) -> GraphIngestor {
        GraphIngestor::open(SurrealDbConfig::memory(), batch_size)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        check_reimport_is_idempotent(&open(3).await).await;
    }

    #[tokio::test]
    async fn test_wipe_then_reimport() {
        let config = SurrealDbConfig {
            wipe_batch_size: 7,
            ..SurrealDbConfig::memory()
        };
        let store = GraphIngestor::open(config, 10).await.unwrap();
        check_wipe_then_reimport(&store).await;
    }

    #[tokio::test]
    async fn test_chunk_size_independence() {
        let small = contents_for_batch_size(open, 1, &GRAPH_DUMP).await;
        let medium = contents_for_batch_size(open, 100, &GRAPH_DUMP).await;
        let large = contents_for_batch_size(open, 50_000, &GRAPH_DUMP).await;
        assert_eq!(small, medium);
        assert_eq!(medium, large);
    }
}
