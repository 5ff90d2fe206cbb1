//! Host keyboard/joystick -> `C64::set_input` button-id mapping. Button ids
//! 0-63 are `row * 8 + col` into the 8x8 keyboard matrix, 64-68 are
//! joystick 1 (up/down/left/right/fire), 69-73 are joystick 2. The
//! (row, col) assignments below follow the published C64 keyboard matrix
//! (c64-wiki.com/wiki/Keyboard), not PC key geometry, so a few PC keys
//! (e.g. `=`) land on the nearest C64 equivalent.

use std::collections::HashMap;

use c64_core::core::machine::InputButton;
use sdl2::keyboard::Scancode;

/// Maps SDL scancodes to `C64::set_input` button IDs.
pub struct KeyMap {
    map: HashMap<Scancode, u8>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a scancode to a `C64::set_input` button id.
    pub fn bind(&mut self, scancode: Scancode, button_id: u8) {
        self.map.insert(scancode, button_id);
    }

    /// Look up the button id for a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<u8> {
        self.map.get(&scancode).copied()
    }
}

fn key(row: u8, col: u8) -> u8 {
    row * 8 + col
}

/// Build the default PC-keyboard-to-C64-matrix key map. `buttons` is
/// unused (the mapping is fixed by the matrix, not machine-reported names)
/// but kept for symmetry with the frontend's generic `Machine::input_map`.
pub fn default_key_map(_buttons: &[InputButton]) -> KeyMap {
    let mut km = KeyMap::new();

    // Row 0
    km.bind(Scancode::Backspace, key(0, 0)); // DEL/INST
    km.bind(Scancode::Return, key(0, 1));
    km.bind(Scancode::F7, key(0, 3));
    km.bind(Scancode::F1, key(0, 4));
    km.bind(Scancode::F3, key(0, 5));
    km.bind(Scancode::F5, key(0, 6));

    // Row 1
    km.bind(Scancode::Num3, key(1, 0));
    km.bind(Scancode::W, key(1, 1));
    km.bind(Scancode::A, key(1, 2));
    km.bind(Scancode::Num4, key(1, 3));
    km.bind(Scancode::Z, key(1, 4));
    km.bind(Scancode::S, key(1, 5));
    km.bind(Scancode::E, key(1, 6));
    km.bind(Scancode::LShift, key(1, 7));

    // Row 2
    km.bind(Scancode::Num5, key(2, 0));
    km.bind(Scancode::R, key(2, 1));
    km.bind(Scancode::D, key(2, 2));
    km.bind(Scancode::Num6, key(2, 3));
    km.bind(Scancode::C, key(2, 4));
    km.bind(Scancode::F, key(2, 5));
    km.bind(Scancode::T, key(2, 6));
    km.bind(Scancode::X, key(2, 7));

    // Row 3
    km.bind(Scancode::Num7, key(3, 0));
    km.bind(Scancode::Y, key(3, 1));
    km.bind(Scancode::G, key(3, 2));
    km.bind(Scancode::Num8, key(3, 3));
    km.bind(Scancode::B, key(3, 4));
    km.bind(Scancode::H, key(3, 5));
    km.bind(Scancode::U, key(3, 6));
    km.bind(Scancode::V, key(3, 7));

    // Row 4
    km.bind(Scancode::Num9, key(4, 0));
    km.bind(Scancode::I, key(4, 1));
    km.bind(Scancode::J, key(4, 2));
    km.bind(Scancode::Num0, key(4, 3));
    km.bind(Scancode::M, key(4, 4));
    km.bind(Scancode::K, key(4, 5));
    km.bind(Scancode::O, key(4, 6));
    km.bind(Scancode::N, key(4, 7));

    // Row 5
    km.bind(Scancode::Equals, key(5, 0)); // +
    km.bind(Scancode::P, key(5, 1));
    km.bind(Scancode::L, key(5, 2));
    km.bind(Scancode::Minus, key(5, 3));
    km.bind(Scancode::Period, key(5, 4));
    km.bind(Scancode::Semicolon, key(5, 5)); // :
    km.bind(Scancode::LeftBracket, key(5, 6)); // @
    km.bind(Scancode::Comma, key(5, 7));

    // Row 6
    km.bind(Scancode::RightBracket, key(6, 1)); // *
    km.bind(Scancode::Apostrophe, key(6, 2)); // ;
    km.bind(Scancode::Home, key(6, 3)); // HOME/CLR
    km.bind(Scancode::RShift, key(6, 4));
    km.bind(Scancode::Slash, key(6, 7));

    // Row 7
    km.bind(Scancode::Num1, key(7, 0));
    km.bind(Scancode::Tab, key(7, 1)); // left-arrow
    km.bind(Scancode::LCtrl, key(7, 2));
    km.bind(Scancode::Num2, key(7, 3));
    km.bind(Scancode::Space, key(7, 4));
    km.bind(Scancode::LAlt, key(7, 5)); // C=
    km.bind(Scancode::Q, key(7, 6));
    km.bind(Scancode::Escape, key(7, 7)); // RUN/STOP

    // Joystick 2 on the arrow keys + right ctrl: most single-player C64
    // software reads joystick port 2.
    km.bind(Scancode::Up, 69);
    km.bind(Scancode::Down, 70);
    km.bind(Scancode::Left, 71);
    km.bind(Scancode::Right, 72);
    km.bind(Scancode::RCtrl, 73);

    km
}
