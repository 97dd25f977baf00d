//! Applying catalog effects to NPC attributes.

use townlet_types::{Effect, EffectAttribute, Npc};

/// Clamp a computed stat into the `[0, 100]` range a stat field holds.
fn clamp_stat(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 100)).unwrap_or(0)
}

/// Apply an effect to an NPC's attribute, scaled by `factor`.
///
/// `factor` is the consumption multiplier (item quantity for `eat`).
/// The target attribute saturates into `[0, 100]`; the other attributes
/// are untouched.
pub fn apply_effect(npc: &mut Npc, effect: &Effect, factor: i64) {
    let delta = i64::from(effect.change).saturating_mul(factor);
    match effect.attribute {
        EffectAttribute::Hunger => {
            npc.hunger = clamp_stat(i64::from(npc.hunger).saturating_add(delta));
        }
        EffectAttribute::Energy => {
            npc.energy = clamp_stat(i64::from(npc.energy).saturating_add(delta));
        }
        EffectAttribute::Mood => {
            npc.mood = clamp_stat(i64::from(npc.mood).saturating_add(delta));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use townlet_types::{EffectId, PlaceId};

    use super::*;

    fn effect(attribute: EffectAttribute, change: i32) -> Effect {
        Effect {
            id: EffectId::from("effect:test"),
            name: String::from("test"),
            attribute,
            change,
        }
    }

    #[test]
    fn positive_effect_raises_the_attribute() {
        let mut npc = Npc::new("Ada", PlaceId::from("place:home"));
        npc.hunger = 40;
        apply_effect(&mut npc, &effect(EffectAttribute::Hunger, 15), 2);
        assert_eq!(npc.hunger, 70);
    }

    #[test]
    fn effects_clamp_at_both_ends() {
        let mut npc = Npc::new("Ada", PlaceId::from("place:home"));
        npc.mood = 95;
        apply_effect(&mut npc, &effect(EffectAttribute::Mood, 30), 1);
        assert_eq!(npc.mood, 100);

        npc.energy = 10;
        apply_effect(&mut npc, &effect(EffectAttribute::Energy, -30), 1);
        assert_eq!(npc.energy, 0);
    }

    #[test]
    fn only_the_named_attribute_changes() {
        let mut npc = Npc::new("Ada", PlaceId::from("place:home"));
        npc.hunger = 50;
        npc.energy = 50;
        npc.mood = 50;
        apply_effect(&mut npc, &effect(EffectAttribute::Energy, -10), 1);
        assert_eq!((npc.hunger, npc.energy, npc.mood), (50, 40, 50));
    }
}
