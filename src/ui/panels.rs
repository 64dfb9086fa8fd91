/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use realignlib::dialogue::DialogueRunner;
use realignlib::outcome::{GameOutcome, Outcome};
use realignlib::quiz::{QuizPhase, QuizState};

#[derive(Component)]
pub struct DialoguePanel;

#[derive(Component)]
pub struct DialogueText;

#[derive(Component)]
pub struct QuizPanel;

#[derive(Component)]
pub struct QuizText;

#[derive(Component)]
pub struct OutcomePanel;

#[derive(Component)]
pub struct OutcomeText;

fn panel_node(bottom: Val) -> Node {
    Node {
        position_type: PositionType::Absolute,
        bottom,
        left: Val::Percent(10.0),
        right: Val::Percent(10.0),
        padding: UiRect::all(Val::Px(12.0)),
        ..default()
    }
}

pub fn spawn_panels(mut commands: Commands) {
    commands
        .spawn((
            DialoguePanel,
            panel_node(Val::Px(24.0)),
            BackgroundColor(Color::srgba(0.05, 0.05, 0.10, 0.9)),
            Visibility::Hidden,
            GlobalZIndex(5),
        ))
        .with_children(|parent| {
            parent.spawn((
                DialogueText,
                Text::new(""),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(0.85, 0.95, 0.85)),
            ));
        });

    commands
        .spawn((
            QuizPanel,
            panel_node(Val::Px(24.0)),
            BackgroundColor(Color::srgba(0.10, 0.05, 0.05, 0.92)),
            Visibility::Hidden,
            GlobalZIndex(6),
        ))
        .with_children(|parent| {
            parent.spawn((
                QuizText,
                Text::new(""),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.90, 0.80)),
            ));
        });

    commands
        .spawn((
            OutcomePanel,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.8)),
            Visibility::Hidden,
            GlobalZIndex(9),
        ))
        .with_children(|parent| {
            parent.spawn((
                OutcomeText,
                Text::new(""),
                TextFont {
                    font_size: 26.0,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.95, 0.95)),
            ));
        });
}

pub fn sync_dialogue_panel(
    runner: Res<DialogueRunner>,
    mut q_panel: Query<&mut Visibility, With<DialoguePanel>>,
    mut q_text: Query<&mut Text, With<DialogueText>>,
) {
    let Some(mut vis) = q_panel.iter_mut().next() else {
        return;
    };

    match runner.visible_text() {
        Some((name, line)) => {
            *vis = Visibility::Visible;
            if let Some(mut text) = q_text.iter_mut().next() {
                *text = Text::new(format!("{name}:\n{line}"));
            }
        }
        None => *vis = Visibility::Hidden,
    }
}

pub fn sync_quiz_panel(
    quiz: Res<QuizState>,
    mut q_panel: Query<&mut Visibility, With<QuizPanel>>,
    mut q_text: Query<&mut Text, With<QuizText>>,
) {
    let Some(mut vis) = q_panel.iter_mut().next() else {
        return;
    };

    let Some(active) = quiz.active.as_ref() else {
        *vis = Visibility::Hidden;
        return;
    };
    *vis = Visibility::Visible;

    let Some(mut text) = q_text.iter_mut().next() else {
        return;
    };
    *text = match active.phase {
        QuizPhase::Open => Text::new(format!(
            "DIRECTIVE CHECK ({:.0}s)\n\n{}\n\n[T]rue / [F]alse",
            active.countdown.remaining_secs().ceil(),
            active.prompt
        )),
        QuizPhase::Confirm(_) | QuizPhase::Explanation(_) => Text::new(active.feedback.clone()),
    };
}

pub fn sync_outcome_panel(
    outcome: Res<GameOutcome>,
    mut q_panel: Query<&mut Visibility, With<OutcomePanel>>,
    mut q_text: Query<&mut Text, With<OutcomeText>>,
) {
    let Some(mut vis) = q_panel.iter_mut().next() else {
        return;
    };

    let Some(result) = outcome.result else {
        *vis = Visibility::Hidden;
        return;
    };
    *vis = Visibility::Visible;

    let title = match result {
        Outcome::Won => "FACTORY SAVED",
        Outcome::Lost => "FACTORY LOST",
    };
    if let Some(mut text) = q_text.iter_mut().next() {
        *text = Text::new(format!(
            "{title}\n\n{}\n\n[Enter] Play again",
            outcome.message
        ));
    }
}
