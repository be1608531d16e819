use serde::Serialize;

use crate::types::OriginSet;

/// The coarse severity bucket attached to every `Advice` (§4.F step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    pub text: &'static str,
    pub label: Label,
}

/// The 12-row advisory decision table, first match wins. `m` is
/// `ripe_managed`; `r` is the set of origins the `ripe` DB carries for this
/// prefix; `b` is the BGP origin set (empty if unseen in BGP); `anywhere`
/// and `anywhere_not_ripe` are unions of origins across all IRR DBs, with
/// and without `ripe` respectively.
pub fn classify(m: bool, r: &OriginSet, b: &OriginSet, anywhere: &OriginSet, anywhere_not_ripe: &OriginSet) -> Advice {
    if m && !r.is_empty() && b.is_subset(r) {
        if anywhere.len() == 1 && !b.is_subset(anywhere_not_ripe) {
            return Advice {
                text: "Perfect",
                label: Label::Success,
            };
        }
        if b == anywhere_not_ripe {
            return Advice {
                text: "Proper RIPE DB object, but foreign or proxy objects also exist",
                label: Label::Warning,
            };
        }
        if b.is_subset(anywhere_not_ripe) {
            return Advice {
                text: "Proper RIPE DB object, but foreign objects also exist, consider removing these",
                label: Label::Warning,
            };
        }
        return Advice {
            text: "Looks good, but multiple entries exists in RIPE DB",
            label: Label::Success,
        };
    }

    if m && !r.is_empty() {
        return if !b.is_empty() {
            Advice {
                text: "Prefix is in DFZ, but registered with wrong origin in RIPE!",
                label: Label::Danger,
            }
        } else {
            Advice {
                text: "Not seen in BGP, but (legacy?) route-objects exist, consider clean-up",
                label: Label::Warning,
            }
        };
    }

    if m {
        return if !b.is_empty() {
            Advice {
                text: "Prefix is in DFZ, but NOT registered in RIPE!",
                label: Label::Danger,
            }
        } else {
            Advice {
                text: "Route objects in foreign registries exist, consider moving them to RIPE DB",
                label: Label::Warning,
            }
        };
    }

    if !b.is_empty() {
        if b.is_subset(anywhere) {
            return if anywhere.len() == 1 {
                Advice {
                    text: "Looks good: in BGP consistent origin AS in route-objects",
                    label: Label::Success,
                }
            } else {
                Advice {
                    text: "Multiple route-object exist with different origins",
                    label: Label::Warning,
                }
            };
        }
        return Advice {
            text: "Prefix in DFZ, but no route-object with correct origin anywhere",
            label: Label::Danger,
        };
    }

    Advice {
        text: "Not seen in BGP, but (legacy?) route-objects exist, consider clean-up",
        label: Label::Warning,
    }
}
