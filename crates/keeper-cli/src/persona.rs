use keeper_kpi::engine::{KpiKind, KpiSet};
use serde::Serialize;

/// The staff member a report is prepared for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::FromStr,
)]
pub enum Persona {
    /// Team-level threat picture: PI3 and PI5
    HeadCoach,
    /// Goalkeeper behaviour: PI1, PI2 and PI4
    GoalkeeperCoach,
}

impl Persona {
    pub fn kpis(self) -> KpiSet {
        match self {
            Persona::HeadCoach => [KpiKind::ThreatZones, KpiKind::Channels]
                .into_iter()
                .collect(),
            Persona::GoalkeeperCoach => [
                KpiKind::Positional,
                KpiKind::Displacement,
                KpiKind::Reaction,
            ]
            .into_iter()
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personas_split_the_kpis() {
        let head = Persona::HeadCoach.kpis();
        let keeper = Persona::GoalkeeperCoach.kpis();
        for kind in KpiKind::ALL {
            assert!(head.contains(kind) != keeper.contains(kind), "{kind}");
        }
    }

    #[test]
    fn test_parse_persona() {
        assert_eq!("headcoach".parse::<Persona>().unwrap(), Persona::HeadCoach);
        assert_eq!(
            "GoalkeeperCoach".parse::<Persona>().unwrap(),
            Persona::GoalkeeperCoach
        );
        assert!("analyst".parse::<Persona>().is_err());
    }
}
