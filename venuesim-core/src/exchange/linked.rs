//! Linked-order bookkeeping: OCO pairs and bracket children.
//!
//! Relations live in side tables keyed by stable ids (no cross-pointers):
//! the symmetric `oco_orders` pair table, `child_orders` for dormant bracket
//! legs, and `position_oco_orders` for the protecting group of a position.

use super::SimulatedExchange;
use crate::domain::ids::{ClientOrderId, PositionId};
use crate::events::{OrderCancelled, OrderEvent, OrderRejected};
use tracing::{debug, error};

impl SimulatedExchange {
    /// Run the OCO cascade for an order that just completed.
    ///
    /// Removes both directions of the pair, then: a sibling that never
    /// reached the book (dormant bracket child) is rejected; a working
    /// sibling is cancelled.
    pub(crate) fn check_oco_order(&mut self, cl_ord_id: &ClientOrderId) {
        let Some(other) = self.oco_orders.remove(cl_ord_id) else {
            return;
        };
        self.oco_orders.remove(&other);

        // Reject a dormant sibling still parked under a bracket parent.
        // Already-completed children are skipped.
        let mut reject_pending = false;
        for children in self.child_orders.values_mut() {
            if let Some(child) = children.iter_mut().find(|c| c.cl_ord_id == other) {
                if !child.is_completed() && !child.is_working() {
                    match child.reject() {
                        Ok(()) => reject_pending = true,
                        Err(e) => error!(error = %e, "OCO reject skipped"),
                    }
                }
            }
        }
        if reject_pending {
            let reason = format!("OCO order rejected from {cl_ord_id}");
            let now = self.clock.now();
            let event_id = self.next_event_id();
            self.emit_order_event(OrderEvent::Rejected(OrderRejected {
                account_id: self.account_id(),
                cl_ord_id: other.clone(),
                reason,
                event_id,
                ts_event: now,
                ts_init: now,
            }));
        }

        if let Some(mut sibling) = self.working_orders.remove(&other) {
            if let Err(e) = sibling.cancel() {
                error!(error = %e, "OCO cancel skipped");
                return;
            }
            debug!(cl_ord_id = %other, from = %cl_ord_id, "OCO sibling cancelled");
            let venue_order_id = sibling
                .venue_order_id
                .clone()
                .unwrap_or_else(|| self.ids.order_id(&sibling.symbol));
            let now = self.clock.now();
            let event_id = self.next_event_id();
            self.emit_order_event(OrderEvent::Cancelled(OrderCancelled {
                account_id: self.account_id(),
                cl_ord_id: other,
                venue_order_id,
                event_id,
                ts_event: now,
                ts_init: now,
            }));
        }
    }

    /// Silently drop the dormant children of a cancelled or expired bracket
    /// parent, along with their pair/position table rows (no events).
    pub(crate) fn clean_up_child_orders(&mut self, cl_ord_id: &ClientOrderId) {
        if let Some(children) = self.child_orders.remove(cl_ord_id) {
            for child in &children {
                self.position_index.remove(&child.cl_ord_id);
                if let Some(other) = self.oco_orders.remove(&child.cl_ord_id) {
                    self.oco_orders.remove(&other);
                }
            }
            if let Some(position_id) = self.position_index.remove(cl_ord_id) {
                self.position_oco_orders.remove(&position_id);
            }
        }
    }

    /// Reject the dormant children of a rejected bracket entry and clear
    /// their table rows.
    pub(crate) fn reject_pending_children(&mut self, cl_ord_id: &ClientOrderId) {
        let Some(children) = self.child_orders.remove(cl_ord_id) else {
            return;
        };
        let reason = format!("parent order {cl_ord_id} rejected");
        for mut child in children {
            self.position_index.remove(&child.cl_ord_id);
            if let Some(other) = self.oco_orders.remove(&child.cl_ord_id) {
                self.oco_orders.remove(&other);
            }
            if child.is_completed() {
                continue;
            }
            if let Err(e) = child.reject() {
                error!(error = %e, "child reject skipped");
                continue;
            }
            let now = self.clock.now();
            let event_id = self.next_event_id();
            self.emit_order_event(OrderEvent::Rejected(OrderRejected {
                account_id: self.account_id(),
                cl_ord_id: child.cl_ord_id.clone(),
                reason: reason.clone(),
                event_id,
                ts_event: now,
                ts_init: now,
            }));
        }
        if let Some(position_id) = self.position_index.remove(cl_ord_id) {
            self.position_oco_orders.remove(&position_id);
        }
    }

    /// Cancel every still-working order protecting a now-closed position and
    /// drop the group.
    pub(crate) fn cancel_position_oco_orders(&mut self, position_id: &PositionId) {
        let Some(orders) = self.position_oco_orders.remove(position_id) else {
            return;
        };
        for order in orders {
            if let Some(other) = self.oco_orders.remove(&order.cl_ord_id) {
                self.oco_orders.remove(&other);
            }
            let Some(mut working) = self.working_orders.remove(&order.cl_ord_id) else {
                continue;
            };
            if let Err(e) = working.cancel() {
                error!(error = %e, "position flatten cancel skipped");
                continue;
            }
            debug!(
                cl_ord_id = %working.cl_ord_id,
                position_id = %position_id,
                "protecting order cancelled on position close"
            );
            let venue_order_id = working
                .venue_order_id
                .clone()
                .unwrap_or_else(|| self.ids.order_id(&working.symbol));
            let now = self.clock.now();
            let event_id = self.next_event_id();
            self.emit_order_event(OrderEvent::Cancelled(OrderCancelled {
                account_id: self.account_id(),
                cl_ord_id: working.cl_ord_id.clone(),
                venue_order_id,
                event_id,
                ts_event: now,
                ts_init: now,
            }));
        }
    }
}
