//! Checkout and order state machine flows

mod common;

use common::*;

use rust_decimal::Decimal;
use shared::models::order::{
    CheckoutLine, CheckoutRequest, OrderStatus, ShipRequest,
};
use shared::models::sku::{SkuCreate, VariantAttribute};
use store_server::db::OrderStore;
use store_server::orders::{CheckoutError, TransitionError};

#[tokio::test]
async fn checkout_reserves_stock_and_snapshots_items() {
    let (state, store) = test_state().await;
    seed_catalog(&store, 10, 100, 6).await;

    let detail = checkout_one(&state, 10, 2).await;

    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.total_amount, Decimal::new(4998, 2));
    assert_eq!(counters(&store, 100).await, (4, 2));

    // Snapshot fields survive later catalog edits
    let item = &detail.items[0];
    assert_eq!(item.sku_id, 100);
    assert_eq!(item.product_name, "测试商品 10");
    assert_eq!(item.unit_price, Decimal::new(2499, 2));
    assert_eq!(item.color.as_deref(), Some("navy"));
    assert_eq!(item.size.as_deref(), Some("M"));

    // Creation tracking row is appended once
    let tracking = store.order_tracking(detail.order.id).await.unwrap();
    assert_eq!(tracking.len(), 1);
    assert_eq!(tracking[0].status, OrderStatus::Pending);
    assert_eq!(tracking[0].description, "订单已创建，等待支付");
}

#[tokio::test]
async fn checkout_refuses_unsellable_configuration() {
    let (state, store) = test_state().await;
    seed_catalog(&store, 10, 100, 6).await;

    let err = state
        .checkout
        .create_order(CheckoutRequest {
            lines: vec![CheckoutLine {
                product_id: 10,
                attributes: vec![VariantAttribute::new("size", "XXXL")],
                quantity: 1,
            }],
            shipping_address: "上海市测试路 1 号".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::NotSellable(10)));
    // A catalog miss never touches the ledger
    assert_eq!(counters(&store, 100).await, (6, 0));
}

#[tokio::test]
async fn checkout_is_all_or_nothing() {
    let (state, store) = test_state().await;
    seed_catalog(&store, 10, 100, 6).await;
    seed_catalog_with_attrs(&store, 11, 101, 1, &[("color", "red"), ("size", "L")]).await;

    let err = state
        .checkout
        .create_order(CheckoutRequest {
            lines: vec![
                CheckoutLine {
                    product_id: 10,
                    attributes: vec![VariantAttribute::new("color", "navy")],
                    quantity: 2,
                },
                CheckoutLine {
                    product_id: 11,
                    attributes: vec![VariantAttribute::new("color", "red")],
                    quantity: 3, // only 1 on hand
                },
            ],
            shipping_address: "上海市测试路 1 号".into(),
        })
        .await
        .unwrap_err();

    match err {
        CheckoutError::OutOfStock { sku_id, .. } => assert_eq!(sku_id, 101),
        other => panic!("expected OutOfStock, got {other:?}"),
    }

    // The first line's reservation was rolled back
    assert_eq!(counters(&store, 100).await, (6, 0));
    assert_eq!(counters(&store, 101).await, (1, 0));
}

#[tokio::test]
async fn cancellation_releases_stock_and_is_single_shot() {
    let (state, store) = test_state().await;
    seed_catalog(&store, 10, 100, 5).await;
    let detail = checkout_one(&state, 10, 3).await;
    let order_id = detail.order.id;
    assert_eq!(counters(&store, 100).await, (2, 3));

    let report = state
        .machine
        .transition(order_id, OrderStatus::Cancelled, None)
        .await
        .unwrap();

    assert_eq!(report.releases.len(), 1);
    assert!(report.releases[0].released);
    assert_eq!(report.releases[0].quantity, 3);
    assert_eq!(counters(&store, 100).await, (5, 0));

    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(order.cancelled_at.is_some());

    let tracking = store.order_tracking(order_id).await.unwrap();
    assert_eq!(tracking.len(), 2);
    assert_eq!(tracking[1].description, "订单已取消");

    // Second cancellation hits a terminal state and is rejected — the
    // release batch cannot run twice
    let err = state
        .machine
        .transition(order_id, OrderStatus::Cancelled, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::NotPermitted { .. }));
    assert_eq!(counters(&store, 100).await, (5, 0));
}

#[tokio::test]
async fn full_lifecycle_to_delivered() {
    let (state, store) = test_state().await;
    seed_catalog(&store, 10, 100, 5).await;
    let order_id = checkout_one(&state, 10, 2).await.order.id;

    state
        .machine
        .transition(order_id, OrderStatus::Paid, None)
        .await
        .unwrap();
    assert_eq!(counters(&store, 100).await, (3, 0));

    let ship = ShipRequest {
        carrier: "顺丰速运".into(),
        tracking_number: "SF000111222".into(),
    };
    state
        .machine
        .transition(order_id, OrderStatus::Shipped, Some(&ship))
        .await
        .unwrap();
    state
        .machine
        .transition(order_id, OrderStatus::Delivered, None)
        .await
        .unwrap();

    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.paid_at.is_some());
    assert!(order.shipped_at.is_some());
    assert!(order.delivered_at.is_some());

    // One tracking row per transition, in order
    let tracking = store.order_tracking(order_id).await.unwrap();
    let statuses: Vec<OrderStatus> = tracking.iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered
        ]
    );

    // Terminal: no further transition, not even cancel
    let err = state
        .machine
        .transition(order_id, OrderStatus::Cancelled, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::NotPermitted { .. }));
}

#[tokio::test]
async fn transitions_out_of_terminal_states_are_rejected() {
    let (state, store) = test_state().await;
    seed_catalog(&store, 10, 100, 5).await;
    let order_id = checkout_one(&state, 10, 1).await.order.id;

    state
        .machine
        .transition(order_id, OrderStatus::Cancelled, None)
        .await
        .unwrap();

    for target in [
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ] {
        let err = state
            .machine
            .transition(order_id, target, None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, TransitionError::NotPermitted { .. }),
            "cancelled -> {target} must be rejected"
        );
    }
}

#[tokio::test]
async fn skipping_milestones_is_rejected() {
    let (state, store) = test_state().await;
    seed_catalog(&store, 10, 100, 5).await;
    let order_id = checkout_one(&state, 10, 1).await.order.id;

    // pending -> shipped and pending -> delivered are not edges
    for target in [OrderStatus::Shipped, OrderStatus::Delivered] {
        let err = state
            .machine
            .transition(order_id, target, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotPermitted { .. }));
    }
}

#[tokio::test]
async fn sku_service_seeds_stock_with_purchase_movement() {
    let (state, store) = test_state().await;
    // Product only; the SKU comes from the merchant surface
    seed_catalog(&store, 10, 100, 0).await;

    let sku = state
        .skus
        .create_sku(SkuCreate {
            product_id: 10,
            attributes: vec![
                VariantAttribute::new("color", "black"),
                VariantAttribute::new("size", "XL"),
            ],
            price: Decimal::new(39_90, 2),
            initial_stock: 12,
            alert_threshold: 3,
            warehouse_id: None,
        })
        .await
        .unwrap();

    assert_eq!(sku.sku_code, "10-BLA-XL");
    let level = state.ledger.stock_level(sku.id, None).await.unwrap().unwrap();
    assert_eq!(level.available, 12);
    assert_eq!(level.reserved, 0);
    assert_eq!(level.alert_threshold, 3);

    let movements = store.movements_for(sku.id);
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity, 12);

    // Deactivation is a soft delete; the resolver stops matching it
    assert!(state.skus.deactivate_sku(sku.id).await.unwrap());
    let gone = state
        .resolver
        .resolve(10, &[VariantAttribute::new("color", "black")])
        .await
        .unwrap();
    assert!(gone.is_none());
}
