mod misc;
mod run;
mod transcript;
