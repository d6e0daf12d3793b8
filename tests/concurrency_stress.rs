//! Stress test: toggles, clicks, removals and timeouts racing on many threads

use combo_cast::core::config::{AbilityBinding, CastingConfig, ClassCastingProfile};
use combo_cast::core::types::{ActorId, ClickType, COMBO_LEN};
use combo_cast::engine::{CastingEngine, Collaborators};
use combo_cast::host::{MemoryProfiles, RecordingFeedback, RecordingInvoker};
use combo_cast::loader::ConfigCache;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ACTORS: usize = 8;
const TASKS_PER_ACTOR: usize = 4;
const STEPS: usize = 150;

fn stress_config() -> CastingConfig {
    let mut profile = ClassCastingProfile::new("mage");
    for (combo, skill) in [("LRL", "fireball"), ("RRL", "frost_nova"), ("LLL", "blink")] {
        profile.insert(AbilityBinding {
            combo_pattern: combo.parse().unwrap(),
            skill_id: skill.into(),
            min_level: 1,
        });
    }

    let mut config = CastingConfig {
        timeout: Duration::from_millis(15),
        cooldown: Duration::ZERO,
        click_debounce: Duration::from_millis(1),
        ..CastingConfig::default()
    };
    config.profiles.insert("mage".into(), profile);
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sessions_stay_consistent_under_contention() {
    let invoker = Arc::new(RecordingInvoker::new());
    let profiles = Arc::new(MemoryProfiles::new());
    let hosts = Collaborators {
        feedback: Arc::new(RecordingFeedback::new()),
        invoker: invoker.clone(),
        profiles: profiles.clone(),
    };
    let engine = CastingEngine::new(ConfigCache::with_config(stress_config()), hosts).unwrap();

    let actors: Vec<ActorId> = (0..ACTORS).map(|_| ActorId::new()).collect();
    for actor in &actors {
        profiles.set(*actor, "mage", 10);
    }

    // Watch the invariant while the workers run
    let running = Arc::new(AtomicBool::new(true));
    let watcher = {
        let engine = engine.clone();
        let actors = actors.clone();
        let running = running.clone();
        tokio::spawn(async move {
            while running.load(Ordering::Relaxed) {
                for actor in &actors {
                    let snapshot = engine.snapshot(*actor);
                    assert!(snapshot.clicks.len() < COMBO_LEN);
                }
                tokio::task::yield_now().await;
            }
        })
    };

    let mut workers = Vec::new();
    for (a, actor) in actors.iter().copied().enumerate() {
        for t in 0..TASKS_PER_ACTOR {
            let engine = engine.clone();
            workers.push(tokio::spawn(async move {
                for step in 0..STEPS {
                    match (step * 7 + t * 3 + a) % 11 {
                        0 => {
                            engine.toggle(actor);
                        }
                        1 if step % 5 == 0 => {
                            engine.remove_actor(actor);
                        }
                        2..=5 => {
                            engine.enqueue_click(actor, ClickType::Primary);
                        }
                        6..=8 => {
                            engine.enqueue_click(actor, ClickType::Secondary);
                        }
                        _ => {}
                    }
                    if step % 3 == 0 {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    } else {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
    }

    for worker in workers {
        worker.await.unwrap();
    }
    running.store(false, Ordering::Relaxed);
    watcher.await.unwrap();

    // Let every flush and timeout run out
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stats = engine.stats();
    assert!(stats.activations > 0);
    assert!(engine.registry().is_empty());
    assert_eq!(
        stats.activations,
        stats.deactivations + stats.expirations + stats.removals
    );
    assert!(invoker.cast_count() as u64 <= stats.resolutions);
}
