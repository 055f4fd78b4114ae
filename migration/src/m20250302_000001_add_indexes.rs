use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Bids {
    Table,
    GigId,
    FreelancerId,
}

#[derive(DeriveIden)]
enum Gigs {
    Table,
    OwnerId,
    Status,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Index on bids.gig_id for listing bids and rejecting siblings
        manager
            .create_index(
                Index::create()
                    .name("idx_bids_gig_id")
                    .table(Bids::Table)
                    .col(Bids::GigId)
                    .to_owned(),
            )
            .await?;

        // Index on bids.freelancer_id for "my bids"
        manager
            .create_index(
                Index::create()
                    .name("idx_bids_freelancer_id")
                    .table(Bids::Table)
                    .col(Bids::FreelancerId)
                    .to_owned(),
            )
            .await?;

        // Index on gigs.owner_id for ownership lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_gigs_owner_id")
                    .table(Gigs::Table)
                    .col(Gigs::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Index on gigs.status for the open-gig listing
        manager
            .create_index(
                Index::create()
                    .name("idx_gigs_status")
                    .table(Gigs::Table)
                    .col(Gigs::Status)
                    .to_owned(),
            )
            .await?;

        // At most one hired bid per gig. sea-query has no partial index builder.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_bids_one_hired_per_gig \
                 ON bids (gig_id) WHERE status = 'hired'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS idx_bids_one_hired_per_gig")
            .await?;
        manager
            .drop_index(Index::drop().name("idx_gigs_status").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_gigs_owner_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bids_freelancer_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bids_gig_id").to_owned())
            .await?;

        Ok(())
    }
}
