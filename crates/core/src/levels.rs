//! Initialization-level resolution
//!
//! Classes are registered with the engine in tiers ([`InitializationLevel`]).
//! Within a tier a parent is always registered before its children; ties are
//! broken by declaration order so repeated runs produce the same plan.
//! Deregistration walks the exact reverse sequence.

use std::collections::{BTreeSet, HashMap};

use gdbind_schema::{ClassDescriptor, InitializationLevel};
use tracing::debug;

/// Anything that can be placed in an [`InitializationPlan`]
pub trait ClassNode {
    fn name(&self) -> &str;
    fn parent(&self) -> Option<&str>;
}

impl ClassNode for ClassDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

impl<T: ClassNode + ?Sized> ClassNode for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn parent(&self) -> Option<&str> {
        (**self).parent()
    }
}

/// Errors raised while ordering registration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error(
        "class `{class}` is registered at level `{class_tier}` but its parent `{parent}` \
         is registered later, at level `{parent_tier}`"
    )]
    ParentInLaterTier {
        class: String,
        class_tier: InitializationLevel,
        parent: String,
        parent_tier: InitializationLevel,
    },

    #[error("class `{0}` appears more than once in the registration list")]
    DuplicateClass(String),

    #[error("inheritance cycle involving class `{0}`")]
    Cycle(String),
}

/// Which tier each class registers at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierAssignment {
    default: InitializationLevel,
    assigned: HashMap<String, InitializationLevel>,
}

impl TierAssignment {
    /// An assignment that places every class at `default`
    pub fn new(default: InitializationLevel) -> Self {
        Self {
            default,
            assigned: HashMap::new(),
        }
    }

    /// Place `class` at `level`
    pub fn assign(&mut self, class: impl Into<String>, level: InitializationLevel) {
        self.assigned.insert(class.into(), level);
    }

    /// Builder form of [`TierAssignment::assign`]
    pub fn with(mut self, class: impl Into<String>, level: InitializationLevel) -> Self {
        self.assign(class, level);
        self
    }

    /// Place `class` at `level` unless it already has an explicit tier
    pub fn assign_if_absent(&mut self, class: &str, level: InitializationLevel) {
        self.assigned.entry(class.to_string()).or_insert(level);
    }

    pub fn tier_of(&self, class: &str) -> InitializationLevel {
        self.assigned.get(class).copied().unwrap_or(self.default)
    }

    pub fn default_tier(&self) -> InitializationLevel {
        self.default
    }
}

/// One tier of an [`InitializationPlan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub level: InitializationLevel,
    /// Classes in registration order
    pub classes: Vec<String>,
}

/// Ordered registration sequence across tiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializationPlan {
    tiers: Vec<Tier>,
}

impl InitializationPlan {
    /// Non-empty tiers in startup order
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Classes registered at `level`, in registration order
    pub fn tier(&self, level: InitializationLevel) -> &[String] {
        self.tiers
            .iter()
            .find(|t| t.level == level)
            .map(|t| t.classes.as_slice())
            .unwrap_or(&[])
    }

    /// Full registration sequence, tier by tier
    pub fn registration_order(&self) -> Vec<(InitializationLevel, &str)> {
        self.tiers
            .iter()
            .flat_map(|t| t.classes.iter().map(move |c| (t.level, c.as_str())))
            .collect()
    }

    /// Exact reverse of [`InitializationPlan::registration_order`]
    pub fn deregistration_order(&self) -> Vec<(InitializationLevel, &str)> {
        let mut order = self.registration_order();
        order.reverse();
        order
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(|t| t.classes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Order `classes` for registration.
///
/// Fails if a class's parent is assigned to a later tier than the class itself.
/// A parent outside `classes` is registered elsewhere and is checked against
/// its tier in `tiers`.
pub fn resolve<N: ClassNode>(
    tiers: &TierAssignment,
    classes: &[N],
) -> Result<InitializationPlan, LevelError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(classes.len());
    for (i, class) in classes.iter().enumerate() {
        if index.insert(class.name(), i).is_some() {
            return Err(LevelError::DuplicateClass(class.name().to_string()));
        }
    }

    let levels: Vec<InitializationLevel> = classes.iter().map(|c| tiers.tier_of(c.name())).collect();

    for (i, class) in classes.iter().enumerate() {
        let Some(parent) = class.parent() else {
            continue;
        };
        let parent_tier = match index.get(parent) {
            Some(&p) => levels[p],
            None => tiers.tier_of(parent),
        };
        if parent_tier > levels[i] {
            return Err(LevelError::ParentInLaterTier {
                class: class.name().to_string(),
                class_tier: levels[i],
                parent: parent.to_string(),
                parent_tier,
            });
        }
    }

    let mut plan = InitializationPlan::default();
    for level in InitializationLevel::ALL {
        let members: Vec<usize> = (0..classes.len()).filter(|&i| levels[i] == level).collect();
        if members.is_empty() {
            continue;
        }
        let ordered = sort_tier(classes, &index, &members)?;
        debug!("Level {}: {} classes", level, ordered.len());
        plan.tiers.push(Tier {
            level,
            classes: ordered
                .into_iter()
                .map(|i| classes[i].name().to_string())
                .collect(),
        });
    }

    Ok(plan)
}

/// Kahn's algorithm over the in-tier parent edges, always emitting the
/// earliest-declared ready class next.
fn sort_tier<N: ClassNode>(
    classes: &[N],
    index: &HashMap<&str, usize>,
    members: &[usize],
) -> Result<Vec<usize>, LevelError> {
    let in_tier: BTreeSet<usize> = members.iter().copied().collect();
    let in_tier_parent = |i: usize| {
        classes[i]
            .parent()
            .and_then(|parent| index.get(parent).copied())
            .filter(|p| in_tier.contains(p))
    };

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut ready = BTreeSet::new();
    for &i in members {
        match in_tier_parent(i) {
            Some(p) => children.entry(p).or_default().push(i),
            None => {
                ready.insert(i);
            }
        }
    }

    let mut ordered = Vec::with_capacity(members.len());
    while let Some(next) = ready.pop_first() {
        ordered.push(next);
        if let Some(kids) = children.get(&next) {
            ready.extend(kids.iter().copied());
        }
    }

    if ordered.len() != members.len() {
        let stuck = members
            .iter()
            .find(|i| !ordered.contains(i))
            .map(|&i| classes[i].name().to_string())
            .unwrap_or_default();
        return Err(LevelError::Cycle(stuck));
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use InitializationLevel::*;

    fn class(name: &str, parent: Option<&str>) -> ClassDescriptor {
        ClassDescriptor::new(name, parent)
    }

    fn names(plan: &InitializationPlan, level: InitializationLevel) -> Vec<&str> {
        plan.tier(level).iter().map(String::as_str).collect()
    }

    #[test]
    fn test_parent_before_child_within_tier() {
        // Children declared before their parents
        let classes = vec![
            class("Sprite", Some("Node2D")),
            class("Node2D", Some("Node")),
            class("Label", Some("Control")),
            class("Node", Some("Object")),
            class("Control", Some("Node")),
        ];
        let plan = resolve(&TierAssignment::new(Scene), &classes).unwrap();

        assert_eq!(
            names(&plan, Scene),
            vec!["Node", "Node2D", "Sprite", "Control", "Label"]
        );

        let order = plan.registration_order();
        let position = |name: &str| order.iter().position(|(_, c)| *c == name).unwrap();
        for c in &classes {
            if let Some(parent) = c.parent.as_deref().filter(|p| *p != "Object") {
                assert!(position(parent) < position(&c.name));
            }
        }

        let reverse = plan.deregistration_order();
        let reverse_position = |name: &str| reverse.iter().position(|(_, c)| *c == name).unwrap();
        assert!(reverse_position("Sprite") < reverse_position("Node2D"));
        assert!(reverse_position("Node2D") < reverse_position("Node"));
    }

    #[test]
    fn test_ties_follow_declaration_order() {
        let classes = vec![
            class("B", None),
            class("A", None),
            class("C", Some("A")),
            class("D", Some("B")),
        ];
        let plan = resolve(&TierAssignment::new(Core), &classes).unwrap();
        // B and A are both ready first; B was declared first
        assert_eq!(names(&plan, Core), vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let classes = vec![
            class("Leaf", Some("Mid")),
            class("Root", None),
            class("Mid", Some("Root")),
            class("Other", Some("Root")),
        ];
        let tiers = TierAssignment::new(Scene).with("Root", Core);
        let first = resolve(&tiers, &classes).unwrap();
        let second = resolve(&tiers, &classes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tiers_in_startup_order() {
        let classes = vec![
            class("EditorThing", Some("Node")),
            class("Node", Some("Object")),
            class("Object", None),
            class("Server", Some("Object")),
        ];
        let tiers = TierAssignment::new(Scene)
            .with("Object", Core)
            .with("Server", Servers)
            .with("EditorThing", Editor);
        let plan = resolve(&tiers, &classes).unwrap();

        let levels: Vec<_> = plan.tiers().iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![Core, Servers, Scene, Editor]);
        assert_eq!(
            plan.registration_order(),
            vec![
                (Core, "Object"),
                (Servers, "Server"),
                (Scene, "Node"),
                (Editor, "EditorThing"),
            ]
        );
        assert_eq!(plan.deregistration_order()[0], (Editor, "EditorThing"));
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn test_parent_in_later_tier_fails() {
        let classes = vec![class("Node", None), class("Node2D", Some("Node"))];
        let tiers = TierAssignment::new(Scene)
            .with("Node", Editor)
            .with("Node2D", Scene);
        let err = resolve(&tiers, &classes).unwrap_err();
        assert_eq!(
            err,
            LevelError::ParentInLaterTier {
                class: "Node2D".to_string(),
                class_tier: Scene,
                parent: "Node".to_string(),
                parent_tier: Editor,
            }
        );
    }

    #[test]
    fn test_external_parent_checked_against_its_tier() {
        // Parent generated by another module, at the default tier
        let classes = vec![class("Node", Some("Object"))];
        let tiers = TierAssignment::new(Scene).with("Node", Core);
        assert_eq!(
            resolve(&tiers, &classes),
            Err(LevelError::ParentInLaterTier {
                class: "Node".to_string(),
                class_tier: Core,
                parent: "Object".to_string(),
                parent_tier: Scene,
            })
        );

        let classes = vec![class("MyNode", Some("Node"))];
        let tiers = TierAssignment::new(Scene).with("Node", Editor);
        assert!(matches!(
            resolve(&tiers, &classes),
            Err(LevelError::ParentInLaterTier { .. })
        ));

        // Same or earlier tier is fine
        let tiers = TierAssignment::new(Scene).with("Node", Core);
        let plan = resolve(&tiers, &classes).unwrap();
        assert_eq!(names(&plan, Scene), vec!["MyNode"]);
    }

    #[test]
    fn test_duplicate_and_cycle() {
        let dup = vec![class("A", None), class("A", None)];
        assert_eq!(
            resolve(&TierAssignment::default(), &dup),
            Err(LevelError::DuplicateClass("A".to_string()))
        );

        let cyclic = vec![class("A", Some("B")), class("B", Some("A"))];
        assert!(matches!(
            resolve(&TierAssignment::default(), &cyclic),
            Err(LevelError::Cycle(_))
        ));
    }

    #[test]
    fn test_empty_tier_lookup() {
        let plan = resolve::<ClassDescriptor>(&TierAssignment::default(), &[]).unwrap();
        assert!(plan.is_empty());
        assert!(plan.tier(Servers).is_empty());
    }
}
