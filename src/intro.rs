/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use realignlib::player::PlayerControlLock;

const INTRO_SECS: f32 = 10.0;

const INTRO_TEXT: &str = "\
FACTORY ALERT

The floor robots are misaligned and will wreck the machines.
Each machine survives two hits. Lose them all and the factory melts down.

Walk up to a robot and press E to challenge its directive.
Answer the true/false statement with T or F before the timer runs out.
A correct answer realigns the robot for good. A wrong answer, or silence,
counts against you.

Realign every robot without a single failed directive to save the factory.

[Space] Skip";

#[derive(Component)]
struct IntroPanel;

/// Latched once the briefing has played so a restart goes straight back
/// into the action.
#[derive(Resource)]
struct IntroState {
    timer: Timer,
    done: bool,
}

impl Default for IntroState {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(INTRO_SECS, TimerMode::Once),
            done: false,
        }
    }
}

fn spawn_intro(
    mut commands: Commands,
    mut virt: ResMut<Time<Virtual>>,
    mut lock: ResMut<PlayerControlLock>,
) {
    // The floor is frozen until the briefing clears.
    virt.pause();
    lock.0 = true;

    commands
        .spawn((
            IntroPanel,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.85)),
            GlobalZIndex(10),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(INTRO_TEXT),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::srgb(0.9, 0.9, 0.9)),
                Node {
                    max_width: Val::Px(640.0),
                    ..default()
                },
            ));
        });
}

fn run_intro(
    mut commands: Commands,
    real: Res<Time<Real>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut intro: ResMut<IntroState>,
    mut virt: ResMut<Time<Virtual>>,
    mut lock: ResMut<PlayerControlLock>,
    q_panel: Query<Entity, With<IntroPanel>>,
) {
    if intro.done {
        return;
    }

    intro.timer.tick(real.delta());
    let skip = keys.just_pressed(KeyCode::Space) || keys.just_pressed(KeyCode::Enter);

    if !skip && !intro.timer.is_finished() {
        return;
    }

    intro.done = true;
    for e in q_panel.iter() {
        commands.entity(e).despawn();
    }
    virt.unpause();
    lock.0 = false;
    info!("Briefing dismissed, session begins");
}

pub struct IntroPlugin;

impl Plugin for IntroPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<IntroState>()
            .add_systems(Startup, spawn_intro)
            .add_systems(Update, run_intro);
    }
}
