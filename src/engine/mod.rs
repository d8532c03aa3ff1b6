// Engine modules: animation playback, navigation, dialog audio, timing

pub mod animation;
pub mod dialog;
pub mod game_loop;
pub mod navigation;
