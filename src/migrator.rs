use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_businesses_table::Migration),
            Box::new(m20260101_000002_create_menu_items_table::Migration),
            Box::new(m20260101_000003_create_orders_table::Migration),
            Box::new(m20260101_000004_create_order_items_table::Migration),
            Box::new(m20260101_000005_create_stakeholders_table::Migration),
            Box::new(m20260101_000006_create_subscriptions_table::Migration),
        ]
    }
}

mod m20260101_000001_create_businesses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_businesses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Businesses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Businesses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Businesses::Name).string().not_null())
                        .col(ColumnDef::new(Businesses::StakeholderId).uuid().null())
                        .col(
                            ColumnDef::new(Businesses::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Businesses::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Businesses {
        Table,
        Id,
        Name,
        StakeholderId,
        IsActive,
    }
}

mod m20260101_000002_create_menu_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_menu_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MenuItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuItems::BusinessId).uuid().not_null())
                        .col(ColumnDef::new(MenuItems::Name).string().not_null())
                        .col(ColumnDef::new(MenuItems::Price).decimal().not_null())
                        .col(
                            ColumnDef::new(MenuItems::IsAvailable)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_menu_items_business_id")
                        .table(MenuItems::Table)
                        .col(MenuItems::BusinessId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MenuItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum MenuItems {
        Table,
        Id,
        BusinessId,
        Name,
        Price,
        IsAvailable,
    }
}

mod m20260101_000003_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(Orders::BusinessId).uuid().not_null())
                        .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerPhone).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerEmail).string().null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::AmountTotal).big_integer().null())
                        .col(ColumnDef::new(Orders::Currency).string().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::PaymentStatus).string().not_null())
                        .col(
                            ColumnDef::new(Orders::StripePaymentIntentId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::StripeCheckoutSessionId)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::Notes).string().null())
                        .col(ColumnDef::new(Orders::PickupTime).string().null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Natural key for payment-failed and refund reconciliation
            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_stripe_payment_intent_id")
                        .table(Orders::Table)
                        .col(Orders::StripePaymentIntentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_business_id")
                        .table(Orders::Table)
                        .col(Orders::BusinessId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Orders {
        Table,
        Id,
        OrderNumber,
        BusinessId,
        CustomerName,
        CustomerPhone,
        CustomerEmail,
        TotalAmount,
        AmountTotal,
        Currency,
        Status,
        PaymentStatus,
        StripePaymentIntentId,
        StripeCheckoutSessionId,
        Notes,
        PickupTime,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000004_create_order_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000004_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::MenuItemId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ItemName).string().not_null())
                        .col(ColumnDef::new(OrderItems::ItemPrice).decimal().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderItems::Subtotal).decimal().not_null())
                        .col(
                            ColumnDef::new(OrderItems::SpecialInstructions)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum OrderItems {
        Table,
        Id,
        OrderId,
        MenuItemId,
        ItemName,
        ItemPrice,
        Quantity,
        Subtotal,
        SpecialInstructions,
        CreatedAt,
    }
}

mod m20260101_000005_create_stakeholders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000005_create_stakeholders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Stakeholders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Stakeholders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Stakeholders::Name).string().not_null())
                        .col(ColumnDef::new(Stakeholders::Status).string().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Stakeholders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Stakeholders {
        Table,
        Id,
        Name,
        Status,
    }
}

mod m20260101_000006_create_subscriptions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000006_create_subscriptions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Subscriptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Subscriptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::StakeholderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Subscriptions::Plan).string().not_null())
                        .col(ColumnDef::new(Subscriptions::Status).string().not_null())
                        .col(
                            ColumnDef::new(Subscriptions::StripeSubscriptionId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::CurrentPeriodEnd)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Subscriptions::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Upsert key for subscription-mode checkout events
            manager
                .create_index(
                    Index::create()
                        .name("idx_subscriptions_stakeholder_id")
                        .table(Subscriptions::Table)
                        .col(Subscriptions::StakeholderId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_subscriptions_stripe_subscription_id")
                        .table(Subscriptions::Table)
                        .col(Subscriptions::StripeSubscriptionId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Subscriptions {
        Table,
        Id,
        StakeholderId,
        Plan,
        Status,
        StripeSubscriptionId,
        CurrentPeriodEnd,
        CreatedAt,
        UpdatedAt,
    }
}
