// vim: tw=80
//! Testing a checkout flow against a mocked payment gateway
//!
//! The gateway is a trait so that the real implementation can be swapped for
//! a mock in tests.  The mock is only generated in test builds.

#[cfg(test)]
use mockable::mockable;

#[derive(Clone, Debug, PartialEq)]
pub enum Declined {
    InsufficientFunds,
    Timeout,
}

#[cfg_attr(test, mockable)]
pub trait Gateway {
    fn charge(&self, account: &str, cents: u64) -> Result<u64, Declined>;
    fn notify(&self, account: &str, message: &str);
}

/// Charge `account`, retrying once on a timeout, and tell the customer how it
/// went.
pub fn checkout(gateway: &dyn Gateway, account: &str, cents: u64)
    -> Result<u64, Declined>
{
    let receipt = match gateway.charge(account, cents) {
        Err(Declined::Timeout) => gateway.charge(account, cents),
        other => other,
    };
    match &receipt {
        Ok(id) => gateway.notify(account, &format!("receipt #{}", id)),
        Err(e) => gateway.notify(account, &format!("declined: {:?}", e)),
    }
    receipt
}

struct Offline;

impl Gateway for Offline {
    fn charge(&self, _account: &str, _cents: u64) -> Result<u64, Declined> {
        Err(Declined::Timeout)
    }

    fn notify(&self, account: &str, message: &str) {
        println!("to {}: {}", account, message);
    }
}

fn main() {
    println!("{:?}", checkout(&Offline, "alice", 1999));
}

#[cfg(test)]
mod t {
    use mockable::*;

    use super::*;

    #[test]
    fn retries_once_after_timeout() {
        let gateway = MockGateway::new();
        given(&gateway)
            .charge(any(), any()).will_throw(Declined::Timeout)
            .charge(any(), any()).will_return(Ok(42));
        assert_eq!(Ok(42), checkout(&gateway, "alice", 1999));
        verify(&gateway)
            .charge(value("alice".to_owned()), value(1999)).called(2)
            .notify(any(), value("receipt #42".to_owned())).called(1);
    }

    #[test]
    fn gives_up_after_two_timeouts() {
        let gateway = MockGateway::new();
        given(&gateway).charge(any(), any()).will_throw(Declined::Timeout);
        assert_eq!(Err(Declined::Timeout), checkout(&gateway, "bob", 5));
        verify(&gateway)
            .charge(any(), any()).called(2)
            .notify(value("bob".to_owned()), any()).called(1);
    }

    #[test]
    fn does_not_retry_other_failures() {
        let gateway = MockGateway::new();
        given(&gateway)
            .charge(any(), mockable::matching(|c: &u64| *c > 1000))
                .will_throw(Declined::InsufficientFunds)
            .charge(any(), any()).will_return(Ok(1));
        assert_eq!(Err(Declined::InsufficientFunds),
                   checkout(&gateway, "carol", 5000));
        verify(&gateway).charge(any(), any()).called(1);
    }
}
