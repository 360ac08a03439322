//! Fixed seed vocabularies for the parametric question generator.

use rand::seq::IndexedRandom;
use rand::Rng;

pub const TOPICS: &[&str] = &[
    "severe bleeding",
    "open wounds",
    "fractures or broken bones",
    "serious burns",
    "animal bite",
    "poisonous plant",
    "poisonous mushroom",
    "crush injuries",
    "improvised care with no supplies",
];

pub const SITUATIONS: &[&str] = &[
    "war zones",
    "remote rural areas",
    "low-income or disaster-struck regions",
    "places without cell coverage, clean water, or medical infrastructure",
    "a refugee camp with limited medical supplies",
    "a disaster zone after an earthquake",
    "a flooded village cut off from emergency services",
    "a remote island with no pharmacy or hospital",
    "a collapsed building with people trapped inside",
    "a jungle expedition far from civilization",
    "a desert crossing with no access to water",
    "a mountain pass during a snowstorm",
    "a conflict area with active fighting nearby",
    "a shipwreck survivor stranded on the coast",
    "a remote mining camp with no communication",
    "a rural school with no nurse or doctor",
    "a nomadic community moving through harsh terrain",
    "a remote outpost in the Arctic",
    "a village under quarantine with no outside help",
    "a long-distance hiking trail with no cell signal",
    "a remote oil rig or construction site",
    "a remote forest during a wildfire",
    "a remote farm during a power outage",
];

/// A (topic, situation) pair driving one parametric question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed {
    pub topic: &'static str,
    pub situation: &'static str,
}

impl Seed {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            topic: TOPICS.choose(rng).copied().unwrap_or(TOPICS[0]),
            situation: SITUATIONS.choose(rng).copied().unwrap_or(SITUATIONS[0]),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        vec![self.topic.to_string(), self.situation.to_string()]
    }
}
