use chip8_cli::{CliConf, InputDef, InputKind, InputMap, KeyState, LogLevel, DUMP};
use chip8_hw::Hz;

#[test]
fn test_maze_config() {
    let conf = CliConf::from_yaml(include_str!("../configs/maze.yaml")).unwrap();

    assert_eq!(conf.vm.clock_frequency, Hz(500));
    assert_eq!(conf.vm.seed, Some(1234));
    assert_eq!(conf.frames, 120);
    assert_eq!(conf.log_level, LogLevel::Info);
    assert_eq!(conf.script.len(), 2);
    assert_eq!(conf.script[1].state, KeyState::Released);

    // The file spells out the default layout.
    assert_eq!(conf.keymap, InputDef::default_keymap());

    let input_map = InputMap::new(conf.keymap);
    assert_eq!(input_map.map_key('4'), Some(InputKind::Chip8(0xC)));
    assert_eq!(input_map.map_key('`'), Some(InputKind::Action(DUMP.into())));
}
