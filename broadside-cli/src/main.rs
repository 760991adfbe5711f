use std::{
    collections::HashMap,
    fmt,
    io::{self, BufRead, Write},
};

use clap::{App, Arg, ArgMatches};
use log::LevelFilter;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use simplelog::{Config, SimpleLogger};

use broadside::engine::{AttackStatus, ShipPlacement};
use broadside::model::{GameId, GameOptions, Player, PlayerId, ShipId};
use broadside::store::{GameStore, MemoryStore};
use broadside::{grid, ships, Engine};

fn main() -> io::Result<()> {
    let matches = App::new("Broadside")
        .version("1.0")
        .about("Command line battleship against a scripted opponent.")
        .arg(
            Arg::with_name("name")
                .short("n")
                .long("name")
                .value_name("NAME")
                .help("your player name")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("strength")
                .short("s")
                .long("strength")
                .value_name("STRENGTH")
                .help("bot difficulty")
                .takes_value(true)
                .possible_values(&["0", "1", "2", "3", "4", "5"]),
        )
        .arg(
            Arg::with_name("five_shot")
                .short("5")
                .long("five-shot")
                .help("five shots per turn instead of one"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("increase log output"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));

    let stdin = io::stdin();
    let mut input = InputReader::new(stdin.lock());
    let mut rng = rand::thread_rng();

    let name = match matches.value_of("name") {
        Some(name) => name.to_string(),
        None => input.prompt_raw("What is your name?", |input| {
            if input.is_empty() {
                println!("A name is required.");
                None
            } else {
                Some(input.to_string())
            }
        })?,
    };
    let strength: u8 = matches
        .value_of("strength")
        .unwrap_or("3")
        .parse()
        .unwrap_or(3);

    let store = MemoryStore::new();
    let human = match store.insert_player(Player::new(name)) {
        Ok(player) => player.id,
        Err(err) => {
            eprintln!("could not create player: {}", err);
            std::process::exit(1);
        }
    };
    let bot = match store.insert_player(Player::bot("Broadside", strength)) {
        Ok(player) => player.id,
        Err(err) => {
            eprintln!("could not create opponent: {}", err);
            std::process::exit(1);
        }
    };
    let engine = Engine::new(store);

    let options = GameOptions {
        rated: true,
        five_shot: matches.is_present("five_shot"),
        ..GameOptions::default()
    };
    let game = match engine.create_bot_game(human, bot, options, &mut rng) {
        Ok(game) => game.id,
        Err(err) => {
            eprintln!("could not create game: {}", err);
            std::process::exit(1);
        }
    };

    let placements = choose_placements(&mut rng, &mut input)?;
    if let Err(err) = engine.submit_layout(human, game, &placements) {
        eprintln!("could not submit fleet: {}", err);
        std::process::exit(1);
    }

    run_game(&engine, human, game, &mut input, &mut rng)?;
    Ok(())
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // Logging is best effort; play continues without it.
    let _ = SimpleLogger::init(level, Config::default());
}

/// Choose placements for all ships using input from the player. The engine
/// takes the fleet in one submission, so the working set stays local until
/// the player is done, with overlap and fit checked here.
fn choose_placements(
    rng: &mut impl Rng,
    input: &mut InputReader<impl BufRead>,
) -> io::Result<Vec<ShipPlacement>> {
    enum Command {
        Done,
        Place(ShipId, i32, i32, bool),
        Unplace(ShipId),
        Clear,
        RandomizeRest,
        Help,
    }
    static PLACE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"^(?x)(?:place|put)\s+
        (?P<ship>[a-z\ ]+?)\s+
        (?:(?:at|on|to|->|=>)\s+)?
        (?P<x>[0-9]+)(?:\s*,\s*|\s+)(?P<y>[0-9]+)\s+
        (?P<dir>\w+)$",
        )
        .unwrap()
    });
    static UNPLACE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"^(?x)(?:un-?place|remove)\s+
        (?P<ship>[a-z\ ]+)$",
        )
        .unwrap()
    });

    let mut placed: HashMap<ShipId, ShipPlacement> = HashMap::new();
    println!();
    println!("Place ships. Type help or ? for commands.");
    loop {
        println!();
        let pending: Vec<&str> = ships::fleet()
            .iter()
            .filter(|s| !placed.contains_key(&s.id))
            .map(|s| s.name)
            .collect();
        if pending.is_empty() {
            println!("All ships placed, type done to start the game");
        } else {
            println!("Remaining ships to place: {}", pending.join(", "));
        }
        println!("Your current board setup:");
        show_setup_board(&placed);
        println!();

        let cmd = input.prompt("> ", |input| match input {
            "?" | "help" | "h" => Some(Command::Help),
            "randomize" | "rand" | "random" => Some(Command::RandomizeRest),
            "done" | "start" => Some(Command::Done),
            "clear" => Some(Command::Clear),
            other => {
                if let Some(captures) = PLACE.captures(other) {
                    let ship = match parse_ship(captures.name("ship").unwrap().as_str()) {
                        Some(ship) => ship,
                        None => return None,
                    };
                    let x = match parse_coord(captures.name("x").unwrap().as_str(), "x") {
                        Some(x) => x,
                        None => return None,
                    };
                    let y = match parse_coord(captures.name("y").unwrap().as_str(), "y") {
                        Some(y) => y,
                        None => return None,
                    };
                    let vertical = match captures.name("dir").unwrap().as_str() {
                        "v" | "vert" | "vertical" | "down" | "d" => true,
                        "h" | "horiz" | "horizontal" | "across" | "right" | "r" => false,
                        other => {
                            println!(
                                "invalid direction {}, choose \"vertical\" or \"horizontal\"",
                                other
                            );
                            return None;
                        }
                    };
                    Some(Command::Place(ship, x, y, vertical))
                } else if let Some(captures) = UNPLACE.captures(other) {
                    let name = captures.name("ship").unwrap().as_str();
                    if name == "all" {
                        return Some(Command::Clear);
                    }
                    parse_ship(name).map(Command::Unplace)
                } else {
                    println!("Invalid ship-placement command \"{}\". Use '?' for help", other);
                    None
                }
            }
        })?;

        match cmd {
            Command::Done if placed.len() == ships::fleet().len() => break,
            Command::Done => println!("You must place all your ships first!"),
            Command::Place(ship, x, y, vertical) => {
                let previous = placed.remove(&ship);
                match try_place(&placed, ship, x, y, vertical) {
                    Some(placement) => {
                        placed.insert(ship, placement);
                    }
                    None => {
                        if let Some(previous) = previous {
                            placed.insert(ship, previous);
                        }
                    }
                }
            }
            Command::Unplace(ship) => {
                placed.remove(&ship);
            }
            Command::Clear => placed.clear(),
            Command::RandomizeRest => randomize_rest(rng, &mut placed),
            Command::Help => {
                println!(
                    "Available Commands:
    done                        if all ships are placed, start the game.
    place <ship> <x>,<y> <dir>  place the ship at the given coordinate.
        Possible directions are \"vertical\" and \"horizontal\". See below for ships.
    unplace <ship>              clear the placement of the specified ship.
        Additionally \"all\" may be specified to clear all placements.
    clear                       clears all ship placements.
    randomize                   randomize the placements of the remaining ships.

Available Ships:
    \"carrier\" (\"cv\")
    \"battleship\" (\"bb\")
    \"destroyer\" (\"dd\")
    \"submarine\" (\"ss\")
    \"patrol boat\" (\"pb\")",
                );
            }
        }
    }
    Ok(placed.into_iter().map(|(_, p)| p).collect())
}

fn parse_ship(name: &str) -> Option<ShipId> {
    let ship = match name.trim() {
        "cv" | "carrier" => "Carrier",
        "bb" | "battleship" => "Battleship",
        "dd" | "destroyer" => "Destroyer",
        "ss" | "sub" | "submarine" => "Submarine",
        "pb" | "boat" | "patrol boat" => "Patrol Boat",
        other => {
            println!(
                "invalid ship: {}, choose \"carrier\", \"battleship\", \"destroyer\", \"submarine\", or \"patrol boat\"",
                other
            );
            return None;
        }
    };
    ships::by_name(ship).map(|s| s.id)
}

fn parse_coord(text: &str, axis: &str) -> Option<i32> {
    match text.parse::<i32>() {
        Ok(v) if grid::in_grid(v) => Some(v),
        Ok(v) => {
            println!("{} must be in range [0,9], got {}", axis, v);
            None
        }
        Err(_) => {
            println!("invalid {}: {}, must be a number in range [0,9]", axis, text);
            None
        }
    }
}

/// The cells a placement would cover, if it fits the grid.
fn placement_cells(ship: ShipId, x: i32, y: i32, vertical: bool) -> Option<Vec<(i32, i32)>> {
    let size = ships::get(ship)?.size;
    let cells: Vec<(i32, i32)> = if vertical {
        (y..y + size).map(|row| (x, row)).collect()
    } else {
        (x..x + size).map(|col| (col, y)).collect()
    };
    if cells.iter().all(|&(c, r)| grid::in_grid(c) && grid::in_grid(r)) {
        Some(cells)
    } else {
        None
    }
}

fn try_place(
    placed: &HashMap<ShipId, ShipPlacement>,
    ship: ShipId,
    x: i32,
    y: i32,
    vertical: bool,
) -> Option<ShipPlacement> {
    let cells = match placement_cells(ship, x, y, vertical) {
        Some(cells) => cells,
        None => {
            println!("Invalid placement: not enough space on the board.");
            return None;
        }
    };
    let overlap = placed.iter().any(|(&other, p)| {
        placement_cells(other, p.x, p.y, p.vertical)
            .map(|taken| taken.iter().any(|cell| cells.contains(cell)))
            .unwrap_or(false)
    });
    if overlap {
        println!("Invalid placement: overlaps existing ship.");
        return None;
    }
    let name = ships::get(ship)?.name.to_string();
    Some(ShipPlacement {
        name,
        x,
        y,
        vertical,
    })
}

/// Randomize the placements of every un-placed ship.
fn randomize_rest(rng: &mut impl Rng, placed: &mut HashMap<ShipId, ShipPlacement>) {
    for ship in ships::fleet() {
        if placed.contains_key(&ship.id) {
            continue;
        }
        loop {
            let vertical = rng.gen::<bool>();
            let (x, y) = if vertical {
                (
                    rng.gen_range(0, grid::SIZE),
                    rng.gen_range(0, grid::SIZE - ship.size + 1),
                )
            } else {
                (
                    rng.gen_range(0, grid::SIZE - ship.size + 1),
                    rng.gen_range(0, grid::SIZE),
                )
            };
            if let Some(placement) = try_place_quiet(placed, ship.id, x, y, vertical) {
                placed.insert(ship.id, placement);
                break;
            }
        }
    }
}

fn try_place_quiet(
    placed: &HashMap<ShipId, ShipPlacement>,
    ship: ShipId,
    x: i32,
    y: i32,
    vertical: bool,
) -> Option<ShipPlacement> {
    let cells = placement_cells(ship, x, y, vertical)?;
    let overlap = placed.iter().any(|(&other, p)| {
        placement_cells(other, p.x, p.y, p.vertical)
            .map(|taken| taken.iter().any(|cell| cells.contains(cell)))
            .unwrap_or(false)
    });
    if overlap {
        return None;
    }
    Some(ShipPlacement {
        name: ships::get(ship)?.name.to_string(),
        x,
        y,
        vertical,
    })
}

/// Run the turn loop until someone wins.
fn run_game(
    engine: &Engine<MemoryStore>,
    human: PlayerId,
    game: GameId,
    input: &mut InputReader<impl BufRead>,
    rng: &mut impl Rng,
) -> io::Result<()> {
    static FIRE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(?:fire\s+|shoot\s+)?(?P<x>[0-9]+)(?:\s*,\s*|\s+)(?P<y>[0-9]+)$").unwrap()
    });

    loop {
        let current = match engine.find_game(human, game) {
            Ok(game) => game,
            Err(err) => {
                eprintln!("could not load game: {}", err);
                std::process::exit(1);
            }
        };
        if current.winner.is_some() {
            break;
        }

        let mine = view_or_exit(engine.player_game(human, game));
        let theirs = view_or_exit(engine.opponent_game(human, game));
        println!();
        println!("Your fleet:");
        show_player_board(&mine);
        println!();
        println!("Your shots:");
        show_target_board(&theirs);

        let sunk_before: Vec<_> = theirs.layouts.iter().map(|l| l.id).collect();
        let allowed = current.shots_per_turn();
        let mut shots: Vec<(i32, i32)> = Vec::new();
        while shots.len() < allowed {
            let prompt = if allowed == 1 {
                "Fire at (x y):".to_string()
            } else {
                format!("Fire shot {} of {} (x y):", shots.len() + 1, allowed)
            };
            let cell = input.prompt(&prompt, |input| {
                let captures = match FIRE.captures(input) {
                    Some(captures) => captures,
                    None => {
                        println!("Give coordinates like \"3 7\".");
                        return None;
                    }
                };
                let x = parse_coord(captures.name("x").unwrap().as_str(), "x")?;
                let y = parse_coord(captures.name("y").unwrap().as_str(), "y")?;
                Some((x, y))
            })?;
            let already = shots.contains(&cell)
                || theirs.moves.iter().any(|m| (m.x, m.y) == cell);
            if already {
                println!("You already shot there.");
                continue;
            }
            shots.push(cell);
        }

        match engine.attack(human, game, &shots, rng) {
            Ok(AttackStatus::Accepted) => {}
            Ok(AttackStatus::OutOfTurn) => {
                println!("Not your turn.");
                continue;
            }
            Err(err) => {
                eprintln!("attack failed: {}", err);
                std::process::exit(1);
            }
        }

        let after = view_or_exit(engine.opponent_game(human, game));
        for &(x, y) in &shots {
            let hit = after
                .moves
                .iter()
                .find(|m| (m.x, m.y) == (x, y))
                .and_then(|m| m.layout)
                .is_some();
            println!("({}, {}): {}", x, y, if hit { "hit!" } else { "miss" });
        }
        for layout in &after.layouts {
            if !sunk_before.contains(&layout.id) {
                let name = ships::get(layout.ship).map_or("ship", |s| s.name);
                println!("You sank their {}!", name);
            }
        }
    }

    finish_game(engine, human, game);
    Ok(())
}

fn view_or_exit<T>(view: broadside::Result<T>) -> T {
    match view {
        Ok(view) => view,
        Err(err) => {
            eprintln!("could not load board: {}", err);
            std::process::exit(1);
        }
    }
}

fn finish_game(engine: &Engine<MemoryStore>, human: PlayerId, game: GameId) {
    let current = match engine.find_game(human, game) {
        Ok(game) => game,
        Err(_) => return,
    };
    println!();
    if current.winner == Some(human) {
        println!("You win!");
    } else {
        println!("You lose.");
    }
    println!("Final boards:");
    let mine = view_or_exit(engine.player_game(human, game));
    show_player_board(&mine);
    println!();
    let theirs = view_or_exit(engine.opponent_game(human, game));
    show_target_board(&theirs);
    if let Ok(Some(me)) = engine.store().player(human) {
        println!(
            "Record: {} wins, {} losses, rating {}",
            me.wins, me.losses, me.rating
        );
    }
    let _ = engine.destroy_game(human, game);
}

enum Cell {
    Empty,
    Miss,
    Ship(&'static str),
    Hit(&'static str),
    Sunk(&'static str),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Empty => f.pad("~~"),
            Cell::Miss => f.pad("x"),
            Cell::Ship(abbrev) => f.pad(abbrev),
            Cell::Hit(abbrev) => f.pad(&format!("x{}", abbrev)),
            Cell::Sunk(abbrev) => f.pad(&format!("X{}", abbrev)),
        }
    }
}

fn abbrev(ship: ShipId) -> &'static str {
    match ships::get(ship).map(|s| s.name) {
        Some("Carrier") => "cv",
        Some("Battleship") => "bb",
        Some("Destroyer") => "dd",
        Some("Submarine") => "ss",
        Some("Patrol Boat") => "pb",
        _ => "??",
    }
}

/// The player's own board during setup: ships only, nothing shot yet.
fn show_setup_board(placed: &HashMap<ShipId, ShipPlacement>) {
    let mut cells: Vec<Vec<Cell>> = (0..grid::SIZE)
        .map(|_| (0..grid::SIZE).map(|_| Cell::Empty).collect())
        .collect();
    for (&ship, p) in placed {
        if let Some(covered) = placement_cells(ship, p.x, p.y, p.vertical) {
            for (x, y) in covered {
                cells[y as usize][x as usize] = Cell::Ship(abbrev(ship));
            }
        }
    }
    show_board(&cells);
}

/// The player's own board in play: their fleet overlaid with the shots the
/// opponent has taken at it.
fn show_player_board(view: &broadside::engine::PlayerGameView) {
    let mut cells: Vec<Vec<Cell>> = (0..grid::SIZE)
        .map(|_| (0..grid::SIZE).map(|_| Cell::Empty).collect())
        .collect();
    for layout in &view.layouts {
        for (x, y) in layout.cells() {
            cells[y as usize][x as usize] = Cell::Ship(abbrev(layout.ship));
        }
    }
    for m in &view.moves {
        let cell = &mut cells[m.y as usize][m.x as usize];
        *cell = match m.layout {
            None => Cell::Miss,
            Some(id) => {
                let sunk = view
                    .layouts
                    .iter()
                    .find(|l| l.id == id)
                    .map(|l| l.sunk)
                    .unwrap_or(false);
                let name = view
                    .layouts
                    .iter()
                    .find(|l| l.id == id)
                    .map(|l| abbrev(l.ship))
                    .unwrap_or("??");
                if sunk {
                    Cell::Sunk(name)
                } else {
                    Cell::Hit(name)
                }
            }
        };
    }
    show_board(&cells);
}

/// The opponent's board as the player may see it: own shots, with ship
/// identities revealed only once sunk.
fn show_target_board(view: &broadside::engine::OpponentGameView) {
    let mut cells: Vec<Vec<Cell>> = (0..grid::SIZE)
        .map(|_| (0..grid::SIZE).map(|_| Cell::Empty).collect())
        .collect();
    for m in &view.moves {
        cells[m.y as usize][m.x as usize] = match m.layout {
            None => Cell::Miss,
            Some(_) => Cell::Hit("?"),
        };
    }
    for layout in &view.layouts {
        for (x, y) in layout.cells() {
            cells[y as usize][x as usize] = Cell::Sunk(abbrev(layout.ship));
        }
    }
    show_board(&cells);
}

/// Print the grid with row and column headers.
fn show_board(cells: &[Vec<Cell>]) {
    let header: String = (0..grid::SIZE).map(|i| format!("{:^4}", i)).collect();
    println!("   {}", header);
    for (i, row) in cells.iter().enumerate() {
        let line: String = row.iter().map(|cell| format!("{:^4}", cell)).collect();
        println!("{:>2} {}", i, line);
    }
}

/// Reads player input line by line, re-prompting until a line parses.
struct InputReader<B> {
    source: B,
    line: String,
}

impl<B: BufRead> InputReader<B> {
    fn new(source: B) -> Self {
        Self {
            source,
            line: String::new(),
        }
    }

    /// Prompt until `parse` accepts the trimmed, ascii-lowercased line.
    fn prompt<F, T>(&mut self, prompt: &str, parse: F) -> io::Result<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        self.prompt_with(prompt, false, parse)
    }

    /// Prompt keeping the line's original case.
    fn prompt_raw<F, T>(&mut self, prompt: &str, parse: F) -> io::Result<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        self.prompt_with(prompt, true, parse)
    }

    fn prompt_with<F, T>(&mut self, prompt: &str, keep_case: bool, mut parse: F) -> io::Result<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        loop {
            print!("{} ", prompt);
            io::stdout().flush()?;
            self.line.clear();
            if self.source.read_line(&mut self.line)? == 0 {
                // End of input; quit cleanly.
                println!();
                std::process::exit(0);
            }
            if !keep_case {
                self.line.make_ascii_lowercase();
            }
            if let Some(value) = parse(self.line.trim()) {
                return Ok(value);
            }
        }
    }
}
