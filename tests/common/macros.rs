/// Asserts that an agent with the given id has more than the given energy.
#[macro_export]
macro_rules! assert_energy_above {
    ($eco:expr, $id:expr, $min_energy:expr) => {
        let agent = $eco.agent(&$id).expect("Agent not found in ecosystem");
        assert!(
            agent.energy > $min_energy,
            "Agent {} energy {} is not above {}",
            $id,
            agent.energy,
            $min_energy
        );
    };
}

/// Asserts that an agent with the given id is no longer present.
#[macro_export]
macro_rules! assert_agent_gone {
    ($eco:expr, $id:expr) => {
        let alive = $eco.agent(&$id).is_some_and(|a| a.is_alive());
        assert!(!alive, "Agent {} should be gone but was found alive", $id);
    };
}

/// Asserts that the present population matches the expected value.
#[macro_export]
macro_rules! assert_population {
    ($eco:expr, $count:expr) => {
        assert_eq!($eco.population(), $count, "Population count mismatch");
    };
}

/// Asserts that a value lies in the closed interval `[lo, hi]`.
#[macro_export]
macro_rules! assert_within {
    ($value:expr, $lo:expr, $hi:expr) => {
        let v = $value;
        assert!(
            v >= $lo && v <= $hi,
            "{} = {} outside [{}, {}]",
            stringify!($value),
            v,
            $lo,
            $hi
        );
    };
}
