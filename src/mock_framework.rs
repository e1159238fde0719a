//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] (or [`create_mock_order_handle`] for the order
//! service) to get a client and a receiver. Then use helpers like
//! [`expect_get`] or [`expect_place_order`] to assert behavior and script
//! the reply.

use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{Entity, FrameworkError, ResourceClient, ResourceRequest, RowFilter};
use crate::domain::{Order, OrderCreate, OrderId, OrderStatus};
use crate::messages::{OrderRequest, ServiceResponse};
use crate::order_service::{OrderError, OrderHandle};

/// Creates a mock client and a receiver for asserting requests.
///
/// # Testing Strategy
/// When testing *client* logic (e.g. the pricing and capability checks in
/// `OrderClient`) there is no need for a real `ResourceActor`. The mock
/// client sends to a channel the test owns; the test inspects each request
/// and answers it, which makes success, failure and delays deterministic.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Same as [`create_mock_client`], for the order service mailbox.
pub fn create_mock_order_handle(buffer_size: usize) -> (OrderHandle, mpsc::Receiver<OrderRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (OrderHandle::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, oneshot::Sender<Result<T::Id, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(RowFilter<T>, oneshot::Sender<Result<Vec<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::List { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, oneshot::Sender<Result<T::ActionResult, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next order message is a PlaceOrder request
pub async fn expect_place_order(
    receiver: &mut mpsc::Receiver<OrderRequest>,
) -> Option<(OrderCreate, ServiceResponse<Order, OrderError>)> {
    match receiver.recv().await {
        Some(OrderRequest::PlaceOrder { order, respond_to }) => Some((order, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next order message is a GetOrder request
pub async fn expect_get_order(
    receiver: &mut mpsc::Receiver<OrderRequest>,
) -> Option<(OrderId, ServiceResponse<Option<Order>, OrderError>)> {
    match receiver.recv().await {
        Some(OrderRequest::GetOrder { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next order message is a TransitionOrder request
pub async fn expect_transition(
    receiver: &mut mpsc::Receiver<OrderRequest>,
) -> Option<(OrderId, OrderStatus, ServiceResponse<Order, OrderError>)> {
    match receiver.recv().await {
        Some(OrderRequest::TransitionOrder { id, target, respond_to }) => Some((id, target, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{CanteenClient, MenuClient, OrderClient, ProfileClient};
    use crate::domain::{
        Canteen, MenuItem, NewOrder, OrderLine, PickupCode, PricedLine, Principal, Profile, Role, SignUp,
    };
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::time::Duration;

    struct Mocks {
        client: OrderClient,
        profile_rx: mpsc::Receiver<ResourceRequest<Profile>>,
        canteen_rx: mpsc::Receiver<ResourceRequest<Canteen>>,
        menu_rx: mpsc::Receiver<ResourceRequest<MenuItem>>,
        order_rx: mpsc::Receiver<OrderRequest>,
    }

    fn mocks() -> Mocks {
        let (profile_inner, profile_rx) = create_mock_client::<Profile>(10);
        let (canteen_inner, canteen_rx) = create_mock_client::<Canteen>(10);
        let (menu_inner, menu_rx) = create_mock_client::<MenuItem>(10);
        let (order_handle, order_rx) = create_mock_order_handle(10);

        let profile_client = ProfileClient::new(profile_inner);
        let canteen_client = CanteenClient::new(canteen_inner, profile_client.clone());
        let menu_client = MenuClient::new(menu_inner, canteen_client.clone());
        let client = OrderClient::new(order_handle, profile_client, canteen_client, menu_client);

        Mocks { client, profile_rx, canteen_rx, menu_rx, order_rx }
    }

    fn profile(id: &str, role: Role) -> Profile {
        Profile {
            id: id.into(),
            name: id.into(),
            email: format!("{}@campus.edu", id),
            role,
            created_at: Utc::now(),
        }
    }

    fn canteen(id: &str, vendor_id: &str) -> Canteen {
        Canteen {
            id: id.into(),
            name: "Main Canteen".into(),
            location: "Block A".into(),
            vendor_id: vendor_id.into(),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    fn menu_item(id: &str, canteen_id: &str, price: i64) -> MenuItem {
        MenuItem {
            id: id.into(),
            canteen_id: canteen_id.into(),
            name: format!("Item {}", id),
            description: None,
            price: Decimal::new(price, 0),
            is_available: true,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    fn stored_order(id: &str, canteen_id: &str, status: OrderStatus) -> Order {
        Order {
            id: id.into(),
            student_id: "s1".into(),
            canteen_id: canteen_id.into(),
            status,
            total_amount: Decimal::new(130, 0),
            pickup_code: Some(PickupCode::from_number(123_456)),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_mock_client() {
        let (inner, mut receiver) = create_mock_client::<Profile>(10);

        let create_task = tokio::spawn(async move { inner.create(SignUp::new("test@campus.edu", None, Role::Student)).await });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.email, "test@campus.edu");
        responder.send(Ok("user_1".to_string())).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok("user_1".to_string()));
    }

    #[tokio::test]
    async fn test_place_order_prices_from_menu() {
        let Mocks { client, mut profile_rx, mut canteen_rx, mut menu_rx, mut order_rx } = mocks();

        let order_task = tokio::spawn(async move {
            let principal = Principal::new("s1", Role::Student);
            let order = NewOrder::new("s1", "c1", vec![OrderLine::new("a", 2), OrderLine::new("b", 1)]);
            client.place_order(&principal, order).await
        });

        // Stored role lookup
        let (user_id, responder) = expect_get(&mut profile_rx).await.expect("Expected Profile Get");
        assert_eq!(user_id, "s1");
        responder.send(Ok(Some(profile("s1", Role::Student)))).unwrap();

        // Canteen exists
        let (canteen_id, responder) = expect_get(&mut canteen_rx).await.expect("Expected Canteen Get");
        assert_eq!(canteen_id, "c1");
        responder.send(Ok(Some(canteen("c1", "v1")))).unwrap();

        // One lookup per line, in cart order
        let (item_id, responder) = expect_get(&mut menu_rx).await.expect("Expected Menu Get");
        assert_eq!(item_id, "a");
        responder.send(Ok(Some(menu_item("a", "c1", 50)))).unwrap();
        let (item_id, responder) = expect_get(&mut menu_rx).await.expect("Expected Menu Get");
        assert_eq!(item_id, "b");
        responder.send(Ok(Some(menu_item("b", "c1", 30)))).unwrap();

        let (payload, responder) = expect_place_order(&mut order_rx).await.expect("Expected PlaceOrder");
        assert_eq!(
            payload.lines,
            vec![
                PricedLine { menu_item_id: "a".into(), quantity: 2, unit_price: Decimal::new(50, 0) },
                PricedLine { menu_item_id: "b".into(), quantity: 1, unit_price: Decimal::new(30, 0) },
            ]
        );
        assert_eq!(payload.total(), Some(Decimal::new(130, 0)));
        responder.send(Ok(stored_order("o1", "c1", OrderStatus::Pending))).unwrap();

        let placed = order_task.await.unwrap().unwrap();
        assert_eq!(placed.id, "o1");
    }

    #[tokio::test]
    async fn test_invalid_orders_send_nothing() {
        let Mocks { client, mut profile_rx, mut order_rx, .. } = mocks();
        let student = Principal::new("s1", Role::Student);

        let err = client.place_order(&student, NewOrder::new("s1", "c1", vec![])).await.unwrap_err();
        assert!(matches!(err, OrderError::ValidationError(_)));

        let err = client
            .place_order(&student, NewOrder::new("s1", "c1", vec![OrderLine::new("a", 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ValidationError(_)));

        let err = client
            .place_order(&student, NewOrder::new("s2", "c1", vec![OrderLine::new("a", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized(_)));

        assert!(profile_rx.try_recv().is_err());
        assert!(order_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_foreign_menu_item_rejected_before_persist() {
        let Mocks { client, mut profile_rx, mut canteen_rx, mut menu_rx, mut order_rx } = mocks();

        let order_task = tokio::spawn(async move {
            let principal = Principal::new("s1", Role::Student);
            client.place_order(&principal, NewOrder::new("s1", "c1", vec![OrderLine::new("x", 1)])).await
        });

        let (_, responder) = expect_get(&mut profile_rx).await.unwrap();
        responder.send(Ok(Some(profile("s1", Role::Student)))).unwrap();
        let (_, responder) = expect_get(&mut canteen_rx).await.unwrap();
        responder.send(Ok(Some(canteen("c1", "v1")))).unwrap();
        let (_, responder) = expect_get(&mut menu_rx).await.unwrap();
        responder.send(Ok(Some(menu_item("x", "c2", 10)))).unwrap();

        let err = order_task.await.unwrap().unwrap_err();
        assert!(matches!(err, OrderError::ValidationError(_)));
        assert!(order_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_overflowing_total_rejected_before_persist() {
        let Mocks { client, mut profile_rx, mut canteen_rx, mut menu_rx, mut order_rx } = mocks();

        let order_task = tokio::spawn(async move {
            let principal = Principal::new("s1", Role::Student);
            client.place_order(&principal, NewOrder::new("s1", "c1", vec![OrderLine::new("a", 100)])).await
        });

        let (_, responder) = expect_get(&mut profile_rx).await.unwrap();
        responder.send(Ok(Some(profile("s1", Role::Student)))).unwrap();
        let (_, responder) = expect_get(&mut canteen_rx).await.unwrap();
        responder.send(Ok(Some(canteen("c1", "v1")))).unwrap();
        let (_, responder) = expect_get(&mut menu_rx).await.unwrap();
        let mut pricey = menu_item("a", "c1", 1);
        pricey.price = Decimal::MAX;
        responder.send(Ok(Some(pricey))).unwrap();

        let err = order_task.await.unwrap().unwrap_err();
        assert_eq!(err, OrderError::ValidationError("Order total too large".to_string()));
        assert!(order_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_transition() {
        let Mocks { client, mut canteen_rx, mut order_rx, .. } = mocks();

        let task = tokio::spawn(async move {
            let intruder = Principal::new("v2", Role::Vendor);
            client.update_status(&intruder, "o1".into(), OrderStatus::Ready).await
        });

        let (id, responder) = expect_get_order(&mut order_rx).await.expect("Expected GetOrder");
        assert_eq!(id, "o1");
        responder.send(Ok(Some(stored_order("o1", "c1", OrderStatus::Pending)))).unwrap();
        let (_, responder) = expect_get(&mut canteen_rx).await.unwrap();
        responder.send(Ok(Some(canteen("c1", "v1")))).unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized(_)));
        // No transition request was sent.
        assert!(order_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_owner_transition_is_forwarded() {
        let Mocks { client, mut canteen_rx, mut order_rx, .. } = mocks();

        let task = tokio::spawn(async move {
            let owner = Principal::new("v1", Role::Vendor);
            client.mark_ready(&owner, "o1".into()).await
        });

        let (_, responder) = expect_get_order(&mut order_rx).await.unwrap();
        responder.send(Ok(Some(stored_order("o1", "c1", OrderStatus::Pending)))).unwrap();
        let (_, responder) = expect_get(&mut canteen_rx).await.unwrap();
        responder.send(Ok(Some(canteen("c1", "v1")))).unwrap();

        let (id, target, responder) = expect_transition(&mut order_rx).await.expect("Expected TransitionOrder");
        assert_eq!((id.as_str(), target), ("o1", OrderStatus::Ready));
        responder.send(Ok(stored_order("o1", "c1", OrderStatus::Ready))).unwrap();

        assert_eq!(task.await.unwrap().unwrap().status, OrderStatus::Ready);
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let (handle, mut order_rx) = create_mock_order_handle(10);
        let handle = handle.with_timeout(Duration::from_millis(20));

        let err = handle.get("o1".into()).await.unwrap_err();
        assert_eq!(err, OrderError::Timeout(Duration::from_millis(20)));
        assert!(err.is_retryable());
        // The request did reach the mailbox.
        assert!(expect_get_order(&mut order_rx).await.is_some());
    }

    #[tokio::test]
    async fn test_availability_toggle_checks_owner_then_acts() {
        use crate::menu_actor::{MenuAction, MenuActionResult};

        let (profile_inner, _profile_rx) = create_mock_client::<Profile>(10);
        let (canteen_inner, mut canteen_rx) = create_mock_client::<Canteen>(10);
        let (menu_inner, mut menu_rx) = create_mock_client::<MenuItem>(10);
        let canteen_client = CanteenClient::new(canteen_inner, ProfileClient::new(profile_inner));
        let menu_client = MenuClient::new(menu_inner, canteen_client.clone());

        let task = tokio::spawn(async move {
            menu_client.set_available(&Principal::new("v1", Role::Vendor), "a".into(), false).await
        });

        let (_, responder) = expect_get(&mut menu_rx).await.expect("Expected Menu Get");
        responder.send(Ok(Some(menu_item("a", "c1", 50)))).unwrap();
        let (_, responder) = expect_get(&mut canteen_rx).await.expect("Expected Canteen Get");
        responder.send(Ok(Some(canteen("c1", "v1")))).unwrap();

        let (id, action, responder) = expect_action(&mut menu_rx).await.expect("Expected Menu Action");
        assert_eq!(id, "a");
        assert!(matches!(action, MenuAction::SetAvailable(false)));
        responder.send(Ok(MenuActionResult::SetAvailable(true))).unwrap();
        assert_eq!(task.await.unwrap(), Ok(true));

        // Listing canteens ships a filter that the mock can evaluate.
        let list_task = tokio::spawn(async move { canteen_client.list_canteens().await });
        let (filter, responder) = expect_list(&mut canteen_rx).await.expect("Expected Canteen List");
        let rows: Vec<Canteen> = vec![canteen("c2", "v2"), canteen("c1", "v1")]
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect();
        responder.send(Ok(rows)).unwrap();
        assert_eq!(list_task.await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_closed_mailbox_is_unavailable() {
        let (inner, receiver) = create_mock_client::<Canteen>(10);
        drop(receiver);
        let err = inner.get("c1".into()).await.unwrap_err();
        assert_eq!(err, FrameworkError::ActorClosed);
    }
}
