use c64_core::core::machine::Machine;
use sdl2::event::Event;

use crate::input::KeyMap;
use crate::overlay;
use crate::video::Video;

/// Runs the SDL event/render loop until the window is closed. Escape is a
/// real C64 key (RUN/STOP) now, so quitting is window-close only — there is
/// no in-emulator shortcut that would collide with a keystroke a running
/// program might care about.
pub fn run(machine: &mut dyn Machine, key_map: &KeyMap, scale: u32, show_fps: bool) {
    let sdl_context = sdl2::init().expect("Failed to initialize SDL2");
    let sdl_video = sdl_context.video().expect("Failed to init SDL video");

    let (width, height) = machine.display_size();
    let mut video = Video::new(&sdl_video, "C64", width, height, scale);
    let mut event_pump = sdl_context.event_pump().expect("Failed to get event pump");

    let buffer_size = (width * height * 3) as usize;
    let mut framebuffer = vec![0u8; buffer_size];

    let mut frame_count: u32 = 0;
    let mut fps_window_start = std::time::Instant::now();
    let mut fps_text = String::from("0.0");

    'main: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,

                Event::KeyDown {
                    scancode: Some(sc),
                    repeat: false,
                    ..
                } => {
                    if let Some(button_id) = key_map.get(sc) {
                        machine.set_input(button_id, true);
                    }
                }

                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    if let Some(button_id) = key_map.get(sc) {
                        machine.set_input(button_id, false);
                    }
                }

                _ => {}
            }
        }

        machine.run_frame();
        machine.render_frame(&mut framebuffer);

        if show_fps {
            frame_count += 1;
            let elapsed = fps_window_start.elapsed();
            if elapsed.as_secs_f32() >= 1.0 {
                let fps = frame_count as f32 / elapsed.as_secs_f32();
                fps_text = format!("{fps:.1}");
                frame_count = 0;
                fps_window_start = std::time::Instant::now();
            }
            overlay::draw_fps(&mut framebuffer, width as usize, &fps_text);
        }

        video.present(&framebuffer);
    }
}
