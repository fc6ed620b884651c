use crate::model::{AgentRecommendation, AnomalyEvent, FarmProfile, FieldPlot, SensorReading};
use crate::principal::{Principal, UserId};

/// Where a record's ownership chain ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The record names its owner itself
    Owner(UserId),
    /// The record hangs below a farm and belongs to that farm's owner
    Farm { farm: i32, owner: UserId },
}

impl Ownership {
    pub fn owner(&self) -> UserId {
        match self {
            Ownership::Owner(owner) => *owner,
            Ownership::Farm { owner, .. } => *owner,
        }
    }
}

/// Implemented by every entity which can be served to a principal.
///
/// An entity without an ownership chain has no impl, so it can neither be
/// scoped nor authorized.
pub trait Scoped {
    /// Resource name used in error messages and logs
    const RESOURCE: &'static str;

    fn id(&self) -> i32;

    fn ownership(&self) -> Ownership;
}

impl Scoped for FarmProfile {
    const RESOURCE: &'static str = "farm";

    fn id(&self) -> i32 {
        self.id
    }

    fn ownership(&self) -> Ownership {
        Ownership::Owner(self.owner)
    }
}

impl Scoped for FieldPlot {
    const RESOURCE: &'static str = "plot";

    fn id(&self) -> i32 {
        self.id
    }

    fn ownership(&self) -> Ownership {
        Ownership::Farm {
            farm: self.farm,
            owner: self.owner,
        }
    }
}

impl Scoped for SensorReading {
    const RESOURCE: &'static str = "reading";

    fn id(&self) -> i32 {
        self.id
    }

    fn ownership(&self) -> Ownership {
        Ownership::Farm {
            farm: self.farm,
            owner: self.owner,
        }
    }
}

impl Scoped for AnomalyEvent {
    const RESOURCE: &'static str = "anomaly";

    fn id(&self) -> i32 {
        self.id
    }

    fn ownership(&self) -> Ownership {
        Ownership::Farm {
            farm: self.farm,
            owner: self.owner,
        }
    }
}

impl Scoped for AgentRecommendation {
    const RESOURCE: &'static str = "recommendation";

    fn id(&self) -> i32 {
        self.id
    }

    fn ownership(&self) -> Ownership {
        Ownership::Farm {
            farm: self.farm,
            owner: self.owner,
        }
    }
}

/// Object level owner-or-admin rule
pub fn can_access<T: Scoped>(principal: &Principal, record: &T) -> bool {
    if principal.is_admin() {
        return true;
    }
    match record.ownership() {
        Ownership::Owner(owner) => owner == principal.user_id(),
        Ownership::Farm { owner, .. } => owner == principal.user_id(),
    }
}

/// Part of a collection a principal is entitled to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedBy(UserId),
}

impl Scope {
    /// The owner to restrict on, `None` if unrestricted
    pub fn owner(&self) -> Option<UserId> {
        match self {
            Scope::All => None,
            Scope::OwnedBy(owner) => Some(*owner),
        }
    }

    pub fn admits<T: Scoped>(&self, record: &T) -> bool {
        match self {
            Scope::All => true,
            Scope::OwnedBy(owner) => record.ownership().owner() == *owner,
        }
    }
}

pub fn scope(principal: &Principal) -> Scope {
    if principal.is_admin() {
        Scope::All
    } else {
        Scope::OwnedBy(principal.user_id())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::SensorKind;
    use chrono::Utc;

    fn farm(id: i32, owner: UserId) -> FarmProfile {
        FarmProfile {
            id,
            owner,
            name: format!("Farm {}", id),
            location: "Somewhere".to_owned(),
            size: 12.5,
            crop_type: "wheat".to_owned(),
            created_at: Utc::now(),
        }
    }

    fn reading(id: i32, farm: i32, owner: UserId) -> SensorReading {
        SensorReading {
            id,
            plot: 1,
            sensor_type: SensorKind::Moisture,
            value: 0.3,
            timestamp: Utc::now(),
            source: "simulator".to_owned(),
            farm,
            owner,
        }
    }

    #[test]
    fn test_owner_may_access_own_farm() {
        let record = farm(1, 7);
        assert!(can_access(&Principal::user(7), &record));
        assert!(!can_access(&Principal::user(8), &record));
    }

    #[test]
    fn test_admin_may_access_everything() {
        let admin = Principal::admin(1);
        assert!(can_access(&admin, &farm(1, 7)));
        assert!(can_access(&admin, &reading(1, 1, 7)));
    }

    #[test]
    fn test_farm_chain_decides_access() {
        let record = reading(3, 1, 7);
        assert_eq!(Ownership::Farm { farm: 1, owner: 7 }, record.ownership());
        assert!(can_access(&Principal::user(7), &record));
        assert!(!can_access(&Principal::user(9), &record));
    }

    #[test]
    fn test_scope_by_principal() {
        assert_eq!(Scope::All, scope(&Principal::admin(2)));
        assert_eq!(Scope::OwnedBy(2), scope(&Principal::user(2)));
        assert_eq!(None, Scope::All.owner());
        assert_eq!(Some(2), Scope::OwnedBy(2).owner());
    }

    #[test]
    fn test_scope_admits_only_owned_records() {
        let records = vec![reading(1, 1, 7), reading(2, 2, 8), reading(3, 1, 7)];

        let visible: Vec<i32> = records
            .iter()
            .filter(|r| scope(&Principal::user(7)).admits(*r))
            .map(|r| r.id)
            .collect();
        assert_eq!(vec![1, 3], visible);

        let all = records
            .iter()
            .filter(|r| scope(&Principal::admin(99)).admits(*r))
            .count();
        assert_eq!(3, all);
    }
}
