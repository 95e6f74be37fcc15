//! Typed domain separators for canonical hashing.
//!
//! Every hash in the workspace selects a domain via [`HashDomain`]; raw
//! prefix byte strings do not exist outside this module. The enum,
//! `as_bytes()`, `ALL` and `Display` are generated from one list.

/// Declares `HashDomain` enum, `as_bytes()`, `ALL`, and `Display` from one list.
macro_rules! define_hash_domains {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $bytes:expr
        ),+ $(,)?
    ) => {
        /// Typed domain separator for [`super::hash::canonical_hash`].
        ///
        /// Every variant maps to a unique, null-terminated byte string used as
        /// a SHA-256 prefix.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HashDomain {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl HashDomain {
            /// The raw domain-separator bytes (null-terminated).
            #[must_use]
            pub const fn as_bytes(&self) -> &'static [u8] {
                match self {
                    $( Self::$variant => $bytes, )+
                }
            }

            /// All domain variants in declaration order.
            pub const ALL: &[HashDomain] = &[
                $( Self::$variant, )+
            ];
        }

        impl core::fmt::Display for HashDomain {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $( Self::$variant => write!(f, stringify!($variant)), )+
                }
            }
        }
    };
}

define_hash_domains! {
    // Kernel

    /// Cost table projection.
    CostTable => b"SKYROUTE::COST_TABLE::V1\0",

    /// Replayed route (start, actions, end pose).
    RoutePlan => b"SKYROUTE::ROUTE_PLAN::V1\0",

    // Search

    /// Search node fingerprint (pose identity bytes).
    SearchNode => b"SKYROUTE::SEARCH_NODE::V1\0",

    /// Search audit graph.
    SearchGraph => b"SKYROUTE::SEARCH_GRAPH::V1\0",

    // Harness

    /// Bundle artifact content.
    BundleArtifact => b"SKYROUTE::BUNDLE_ARTIFACT::V1\0",

    /// Bundle digest over the normative artifacts.
    BundleDigest => b"SKYROUTE::BUNDLE_DIGEST::V1\0",

    /// Flight log (telemetry CSV) content.
    FlightLog => b"SKYROUTE::FLIGHT_LOG::V1\0",
}
