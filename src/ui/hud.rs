/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use realignlib::factory::Obstacle;
use realignlib::outcome::OutcomeLedger;
use realignlib::robots::EnemyRobot;

#[derive(Component)]
pub struct HudText;

pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        HudText,
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgb(0.8, 0.85, 0.8)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        },
        GlobalZIndex(4),
    ));
}

pub fn sync_hud(
    ledger: Res<OutcomeLedger>,
    q_robots: Query<&EnemyRobot>,
    q_machines: Query<(), With<Obstacle>>,
    mut q_text: Query<&mut Text, With<HudText>>,
) {
    let Some(mut text) = q_text.iter_mut().next() else {
        return;
    };

    let fixed = q_robots.iter().filter(|r| r.quiz_done && !r.hostile).count();
    let total = q_robots.iter().count();

    *text = Text::new(format!(
        "Realigned {fixed}/{total}   Directives {}/{}   Machines standing {}",
        ledger.interacted_count(),
        ledger.required(),
        q_machines.iter().count()
    ));
}
