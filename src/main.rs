/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;
use bevy::window::PresentMode;

use realignlib::ai::FactoryAiPlugin;
use realignlib::dialogue::DialoguePlugin;
use realignlib::interact::InteractionPlugin;
use realignlib::outcome::OutcomePlugin;
use realignlib::player::PlayerPlugin;
use realignlib::quiz::QuizPlugin;
use realignlib::world;

mod intro;
mod restart;
mod ui;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Realign".into(),
                        present_mode: PresentMode::AutoVsync,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        .insert_resource(Time::<Fixed>::from_seconds(1.0 / 60.0))
        .add_plugins((
            QuizPlugin,
            DialoguePlugin,
            InteractionPlugin,
            FactoryAiPlugin,
            PlayerPlugin,
            OutcomePlugin,
            intro::IntroPlugin,
            restart::RestartPlugin,
            ui::UiPlugin,
        ))
        .add_systems(Startup, world::setup)
        .run();
}
