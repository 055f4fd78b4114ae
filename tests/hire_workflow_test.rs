//! Hire workflow tests against the in-memory store and a real presence
//! registry. No database or WebSocket transport is needed.
//!
//! Run with: `cargo test --test hire_workflow_test`
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use chrono::{Duration, Utc};
use sea_orm::DbErr;
use std::sync::Arc;
use uuid::Uuid;

use gigmarket_backend::error::HireError;
use gigmarket_backend::hire::{AtomicOp, HireWorkflow, MemoryHireStore, hire_plan};
use gigmarket_backend::models::bids::{self, BidStatus};
use gigmarket_backend::models::gigs::{self, GigStatus};
use gigmarket_backend::realtime::{
    ConnectionHandle, Delivery, NotificationDispatcher, PresenceRegistry, ServerEvent,
};

struct Fixture {
    store: Arc<MemoryHireStore>,
    presence: Arc<PresenceRegistry>,
    workflow: Arc<HireWorkflow>,
    owner: Uuid,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryHireStore::new());
        let presence = Arc::new(PresenceRegistry::new());
        let workflow = Arc::new(HireWorkflow::new(
            store.clone(),
            Arc::new(NotificationDispatcher::new(presence.clone())),
        ));

        Self {
            store,
            presence,
            workflow,
            owner: Uuid::new_v4(),
        }
    }

    /// Seed an open gig owned by `self.owner` with one pending bid per
    /// freelancer. Returns the gig id and the bid ids in order.
    async fn open_gig_with_bids(&self, title: &str, freelancers: &[Uuid]) -> (Uuid, Vec<Uuid>) {
        let gig = test_gig(self.owner, title);
        let gig_id = gig.id;
        self.store.insert_gig(gig).await;

        let mut bid_ids = Vec::new();
        for (i, freelancer) in freelancers.iter().enumerate() {
            let bid = test_bid(gig_id, *freelancer, i as i64);
            bid_ids.push(bid.id);
            self.store.insert_bid(bid).await;
        }

        (gig_id, bid_ids)
    }

    /// Check the gig/bid relationship invariant for one gig.
    async fn assert_consistent(&self, gig_id: Uuid) {
        let gig = self.store.gig(gig_id).await.expect("gig should exist");
        let bids = self.store.bids_for_gig(gig_id).await;
        let hired: Vec<_> = bids.iter().filter(|b| b.status == BidStatus::Hired).collect();

        match gig.status {
            GigStatus::Assigned => {
                assert_eq!(hired.len(), 1, "assigned gig needs exactly one hired bid");
                assert_eq!(gig.hired_freelancer_id, Some(hired[0].freelancer_id));
                assert!(
                    bids.iter()
                        .filter(|b| b.id != hired[0].id)
                        .all(|b| b.status == BidStatus::Rejected)
                );
            }
            GigStatus::Open => {
                assert!(hired.is_empty(), "open gig must not have a hired bid");
                assert!(gig.hired_freelancer_id.is_none());
            }
        }
    }
}

fn test_gig(owner_id: Uuid, title: &str) -> gigs::Model {
    gigs::Model {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_string(),
        description: "Build a landing page".to_string(),
        budget: 500.0,
        status: GigStatus::Open,
        hired_freelancer_id: None,
        created_at: Utc::now(),
    }
}

fn test_bid(gig_id: Uuid, freelancer_id: Uuid, offset_secs: i64) -> bids::Model {
    bids::Model {
        id: Uuid::new_v4(),
        gig_id,
        freelancer_id,
        message: "I can do this".to_string(),
        price: 450.0,
        status: BidStatus::Pending,
        created_at: Utc::now() + Duration::seconds(offset_secs),
    }
}

#[tokio::test]
async fn test_hire_assigns_gig_and_rejects_siblings() {
    let fx = Fixture::new();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let (gig_id, bids) = fx.open_gig_with_bids("Landing page", &[alice, bob]).await;

    let outcome = fx
        .workflow
        .hire(fx.owner, bids[0])
        .await
        .expect("hire should succeed");

    assert_eq!(outcome.gig_id, gig_id);
    assert_eq!(outcome.bid_id, bids[0]);
    assert_eq!(outcome.freelancer_id, alice);
    assert_eq!(outcome.rejected_bids, 1);

    let gig = fx.store.gig(gig_id).await.unwrap();
    assert_eq!(gig.status, GigStatus::Assigned);
    assert_eq!(gig.hired_freelancer_id, Some(alice));
    assert_eq!(fx.store.bid(bids[0]).await.unwrap().status, BidStatus::Hired);
    assert_eq!(fx.store.bid(bids[1]).await.unwrap().status, BidStatus::Rejected);
    fx.assert_consistent(gig_id).await;
}

#[tokio::test]
async fn test_second_hire_on_assigned_gig_conflicts_without_changes() {
    let fx = Fixture::new();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let (gig_id, bids) = fx.open_gig_with_bids("Landing page", &[alice, bob]).await;

    fx.workflow.hire(fx.owner, bids[0]).await.unwrap();
    let before_gig = fx.store.gig(gig_id).await.unwrap();
    let before_bids = fx.store.bids_for_gig(gig_id).await;

    let result = fx.workflow.hire(fx.owner, bids[1]).await;
    assert!(matches!(result, Err(HireError::AlreadyAssigned(id)) if id == gig_id));

    assert_eq!(fx.store.gig(gig_id).await.unwrap(), before_gig);
    assert_eq!(fx.store.bids_for_gig(gig_id).await, before_bids);
    assert_eq!(before_gig.hired_freelancer_id, Some(alice));
}

#[tokio::test]
async fn test_non_owner_is_forbidden_and_nothing_changes() {
    let fx = Fixture::new();
    let freelancer = Uuid::new_v4();
    let (gig_id, bids) = fx.open_gig_with_bids("Logo", &[freelancer]).await;

    let intruder = Uuid::new_v4();
    let result = fx.workflow.hire(intruder, bids[0]).await;
    assert!(matches!(result, Err(HireError::Forbidden)));

    // The freelancer cannot hire themselves either.
    let result = fx.workflow.hire(freelancer, bids[0]).await;
    assert!(matches!(result, Err(HireError::Forbidden)));

    let gig = fx.store.gig(gig_id).await.unwrap();
    assert_eq!(gig.status, GigStatus::Open);
    assert_eq!(fx.store.bid(bids[0]).await.unwrap().status, BidStatus::Pending);
    fx.assert_consistent(gig_id).await;
}

#[tokio::test]
async fn test_unknown_bid_is_not_found() {
    let fx = Fixture::new();
    let missing = Uuid::new_v4();

    let result = fx.workflow.hire(fx.owner, missing).await;
    assert!(matches!(result, Err(HireError::BidNotFound(id)) if id == missing));
}

#[tokio::test]
async fn test_bid_on_deleted_gig_is_not_found() {
    let fx = Fixture::new();
    let orphan = test_bid(Uuid::new_v4(), Uuid::new_v4(), 0);
    let (orphan_id, orphan_gig) = (orphan.id, orphan.gig_id);
    fx.store.insert_bid(orphan).await;

    let result = fx.workflow.hire(fx.owner, orphan_id).await;
    assert!(matches!(result, Err(HireError::GigNotFound(id)) if id == orphan_gig));
}

#[tokio::test]
async fn test_offline_freelancer_is_still_hired() {
    let fx = Fixture::new();
    let freelancer = Uuid::new_v4();
    let (gig_id, bids) = fx.open_gig_with_bids("Copywriting", &[freelancer]).await;

    let outcome = fx.workflow.hire(fx.owner, bids[0]).await.unwrap();

    assert_eq!(outcome.notification, Delivery::Missed);
    assert_eq!(outcome.rejected_bids, 0);
    assert_eq!(fx.store.gig(gig_id).await.unwrap().status, GigStatus::Assigned);
    fx.assert_consistent(gig_id).await;
}

#[tokio::test]
async fn test_online_freelancer_receives_hired_event() {
    let fx = Fixture::new();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let (_, bids) = fx.open_gig_with_bids("Mobile app", &[alice, bob]).await;

    let (alice_conn, mut alice_rx) = ConnectionHandle::open();
    let (bob_conn, mut bob_rx) = ConnectionHandle::open();
    fx.presence.register(alice, alice_conn).await;
    fx.presence.register(bob, bob_conn).await;

    let outcome = fx.workflow.hire(fx.owner, bids[0]).await.unwrap();
    assert_eq!(outcome.notification, Delivery::Delivered);

    let event = alice_rx.try_recv().expect("alice should be notified");
    assert_eq!(
        event,
        ServerEvent::Hired {
            gig_title: "Mobile app".to_string(),
            freelancer_id: alice,
            message: "You have been hired for \"Mobile app\"!".to_string(),
        }
    );
    assert!(alice_rx.try_recv().is_err(), "delivered at most once");

    // Rejected bidders get nothing.
    assert!(bob_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_closed_connection_counts_as_missed() {
    let fx = Fixture::new();
    let freelancer = Uuid::new_v4();
    let (gig_id, bids) = fx.open_gig_with_bids("Data import", &[freelancer]).await;

    let (conn, rx) = ConnectionHandle::open();
    fx.presence.register(freelancer, conn).await;
    drop(rx);

    let outcome = fx.workflow.hire(fx.owner, bids[0]).await.unwrap();
    assert_eq!(outcome.notification, Delivery::Missed);
    assert_eq!(fx.store.gig(gig_id).await.unwrap().status, GigStatus::Assigned);
}

#[tokio::test]
async fn test_persistence_fault_leaves_no_partial_state() {
    let fx = Fixture::new();
    let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let (gig_id, bids) = fx.open_gig_with_bids("Migration", &[alice, bob, carol]).await;

    // Fail after the gig assignment and the winning bid have been staged.
    fx.store.fail_at_op(2).await;

    let result = fx.workflow.hire(fx.owner, bids[1]).await;
    assert!(matches!(result, Err(HireError::Persistence(DbErr::Custom(_)))));

    let gig = fx.store.gig(gig_id).await.unwrap();
    assert_eq!(gig.status, GigStatus::Open);
    assert!(gig.hired_freelancer_id.is_none());
    assert!(
        fx.store
            .bids_for_gig(gig_id)
            .await
            .iter()
            .all(|b| b.status == BidStatus::Pending)
    );

    // The fault was one-shot; a retry goes through.
    let outcome = fx.workflow.hire(fx.owner, bids[1]).await.unwrap();
    assert_eq!(outcome.freelancer_id, bob);
    assert_eq!(outcome.rejected_bids, 2);
    fx.assert_consistent(gig_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_hires_have_exactly_one_winner() {
    let fx = Fixture::new();

    for round in 0..25 {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let (gig_id, bids) = fx
            .open_gig_with_bids(&format!("Race {round}"), &[alice, bob])
            .await;

        let first = tokio::spawn({
            let workflow = fx.workflow.clone();
            let (owner, bid) = (fx.owner, bids[0]);
            async move { workflow.hire(owner, bid).await }
        });
        let second = tokio::spawn({
            let workflow = fx.workflow.clone();
            let (owner, bid) = (fx.owner, bids[1]);
            async move { workflow.hire(owner, bid).await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(HireError::AlreadyAssigned(_))))
            .count();

        assert_eq!(winners.len(), 1, "round {round}: exactly one hire succeeds");
        assert_eq!(conflicts, 1, "round {round}: the other one conflicts");

        let gig = fx.store.gig(gig_id).await.unwrap();
        assert_eq!(gig.hired_freelancer_id, Some(winners[0].freelancer_id));
        fx.assert_consistent(gig_id).await;
    }
}

#[tokio::test]
async fn test_hire_plan_assigns_gig_first() {
    let gig = test_gig(Uuid::new_v4(), "Plan");
    let bid = test_bid(gig.id, Uuid::new_v4(), 0);

    let plan = hire_plan(&gig, &bid);

    assert_eq!(
        plan,
        vec![
            AtomicOp::AssignGig {
                gig_id: gig.id,
                freelancer_id: bid.freelancer_id,
            },
            AtomicOp::SetBidStatus {
                bid_id: bid.id,
                expected: BidStatus::Pending,
                status: BidStatus::Hired,
            },
            AtomicOp::SetSiblingBidStatus {
                gig_id: gig.id,
                except: bid.id,
                status: BidStatus::Rejected,
            },
        ]
    );
}

#[test]
fn test_hire_errors_map_to_http_statuses() {
    let id = Uuid::new_v4();

    assert_eq!(HireError::BidNotFound(id).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(HireError::GigNotFound(id).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(HireError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(HireError::AlreadyAssigned(id).status_code(), StatusCode::CONFLICT);

    let persistence = HireError::Persistence(DbErr::Custom("connection reset".to_string()));
    assert_eq!(persistence.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!persistence.is_client_error());
    assert!(HireError::Forbidden.is_client_error());
}
