use crate::utils::*;
use chroma_seek_core as game;
use clap::{Args, ValueEnum};
use core::time::Duration;
use game::{CellCount, Epoch, GameEngine, GamePhase};
use gloo::timers::callback::{Interval, Timeout};
use web_time::Instant;
use yew::prelude::*;

/// How often the countdown is advanced, in milliseconds.
const TICK_MS: u32 = 100;

/// How long the board shakes after a miss, in milliseconds.
const SHAKE_MS: u32 = 300;

impl StorageKey for game::HighScores {
    const KEY: &'static str = "chroma-seek:high-scores";
}

fn millis(duration: Duration) -> u32 {
    duration.as_millis().try_into().unwrap_or(u32::MAX)
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq)]
pub(crate) enum ColorSpaceArg {
    Rgb,
    Hsl,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq)]
pub(crate) enum PenaltyArg {
    /// 15 second stages, a miss costs 3 seconds
    Time,
    /// 10 second stages, a miss costs 100 points
    Score,
}

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Color space the target color is derived in
    #[arg(long, value_enum)]
    pub colors: Option<ColorSpaceArg>,

    /// What a click on a wrong tile costs
    #[arg(long, value_enum, default_value_t = PenaltyArg::Time)]
    pub penalty: PenaltyArg,
}

impl GameProps {
    fn rules(&self) -> game::GameRules {
        let rules = match self.penalty {
            PenaltyArg::Time => game::GameRules::time_penalty(),
            PenaltyArg::Score => game::GameRules::score_penalty(),
        };
        match self.colors {
            Some(ColorSpaceArg::Rgb) => rules.with_color_space(game::ColorSpace::Rgb),
            Some(ColorSpaceArg::Hsl) => rules.with_color_space(game::ColorSpace::Hsl),
            None => rules,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Screen {
    MainMenu,
    HighScores,
    Game,
    Result,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Start,
    Retry,
    MainMenu,
    ShowHighScores,
    TileClick(CellCount),
    Tick(Epoch),
    Advance(Epoch),
    ShakeDone,
}

fn stage_label(stage_index: usize, stage_count: usize) -> String {
    format!("{} / {}", (stage_index + 1).min(stage_count), stage_count)
}

fn timer_style(fraction: f64) -> String {
    format!("width: {:.1}%", fraction.clamp(0.0, 1.0) * 100.0)
}

fn result_title(outcome: game::RunOutcome) -> &'static str {
    match outcome {
        game::RunOutcome::Cleared => "All Clear!",
        game::RunOutcome::Failed => "Game Over",
    }
}

#[derive(Properties, Clone, PartialEq)]
struct TileProps {
    index: CellCount,
    color: game::Rgb,
    #[prop_or_default]
    found: bool,
    callback: Callback<CellCount>,
}

#[function_component(TileView)]
fn tile_component(props: &TileProps) -> Html {
    let TileProps {
        index,
        color,
        found,
        callback,
    } = props.clone();

    let class = classes!("tile", found.then_some("found"));
    let style = format!("background-color: {}", color);
    let onclick = Callback::from(move |_: MouseEvent| {
        log::trace!("tile {} clicked", index);
        callback.emit(index);
    });

    html! {
        <div {class} {style} {onclick}>
            if found {
                <span class="check">{"✔"}</span>
            }
        </div>
    }
}

#[derive(Debug)]
pub(crate) struct GameView {
    engine: GameEngine,
    show_high_scores: bool,
    shaking: bool,
    last_tick: Instant,
    countdown: Option<Interval>,
    advance: Option<Timeout>,
    shake: Option<Timeout>,
}

impl GameView {
    fn screen(&self) -> Screen {
        match self.engine.phase() {
            GamePhase::Idle if self.show_high_scores => Screen::HighScores,
            GamePhase::Idle => Screen::MainMenu,
            GamePhase::InStage | GamePhase::StageCleared => Screen::Game,
            GamePhase::Cleared | GamePhase::Failed => Screen::Result,
        }
    }

    /// Replacing the previous interval drops it, which cancels it.
    fn start_countdown(&mut self, ctx: &Context<Self>, epoch: Epoch) {
        let link = ctx.link().clone();
        self.last_tick = Instant::now();
        self.countdown = Some(Interval::new(TICK_MS, move || {
            link.send_message(Msg::Tick(epoch))
        }));
    }

    fn schedule_advance(&mut self, ctx: &Context<Self>, token: Epoch) {
        let link = ctx.link().clone();
        let delay = millis(self.engine.rules().feedback_delay);
        self.countdown = None;
        self.advance = Some(Timeout::new(delay, move || {
            link.send_message(Msg::Advance(token))
        }));
    }

    fn start_shake(&mut self, ctx: &Context<Self>) {
        let link = ctx.link().clone();
        self.shaking = true;
        self.shake = Some(Timeout::new(SHAKE_MS, move || {
            link.send_message(Msg::ShakeDone)
        }));
    }

    fn stop_timers(&mut self) {
        self.countdown = None;
        self.advance = None;
    }

    fn on_run_finished(&mut self, summary: game::RunSummary) {
        self.stop_timers();
        log::debug!("run finished: {:?}", summary);
        if summary.high_score_rank.is_some() {
            self.engine.high_scores().local_save();
        }
    }

    fn tile_click(&mut self, ctx: &Context<Self>, index: CellCount) -> bool {
        use game::ClickOutcome::*;

        let outcome = match self.engine.tile_click(index) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::trace!("click on {} ignored: {}", index, err);
                return false;
            }
        };

        if outcome.feedback() == Some(game::Feedback::Incorrect) {
            self.start_shake(ctx);
        }

        match outcome {
            StageCleared { advance, .. } => self.schedule_advance(ctx, advance),
            TimedOut(summary) => self.on_run_finished(summary),
            NoChange | Found { .. } | Missed => {}
        }

        outcome.has_update()
    }

    fn view_main_menu(&self, ctx: &Context<Self>) -> Html {
        let cb_start = ctx.link().callback(|_: MouseEvent| Msg::Start);
        let cb_high_scores = ctx.link().callback(|_: MouseEvent| Msg::ShowHighScores);

        html! {
            <section class="main-menu">
                <h1>{"Chroma Seek"}</h1>
                <p>{"Find the tiles with a different color before time runs out."}</p>
                <button onclick={cb_start}>{"Start"}</button>
                <button onclick={cb_high_scores}>{"High Scores"}</button>
            </section>
        }
    }

    fn view_high_scores(&self, ctx: &Context<Self>) -> Html {
        let cb_back = ctx.link().callback(|_: MouseEvent| Msg::MainMenu);
        let high_scores = self.engine.high_scores();

        html! {
            <section class="high-scores">
                <h2>{"High Scores"}</h2>
                <ol>
                    if high_scores.is_empty() {
                        <li>{"No scores yet!"}</li>
                    } else {
                        {
                            for high_scores.entries().iter().map(|entry| html! {
                                <li>
                                    <span>{format!("Score: {}", entry.score)}</span>
                                    <span>{format!("Stage: {}", entry.stage)}</span>
                                </li>
                            })
                        }
                    }
                </ol>
                <button onclick={cb_back}>{"Back"}</button>
            </section>
        }
    }

    fn view_game(&self, ctx: &Context<Self>) -> Html {
        let engine = &self.engine;
        let Some(grid) = engine.grid() else {
            return html! {};
        };

        let stage = stage_label(engine.stage_index(), engine.stage_count());
        let found = engine.found_targets();
        let total = grid.target_count();
        let grid_style = format!("grid-template-columns: repeat({}, 1fr)", grid.side());
        let class = classes!("game", self.shaking.then_some("shake"));
        let callback = ctx.link().callback(Msg::TileClick);

        html! {
            <section {class}>
                <nav>
                    <span>{"Stage "}{stage}</span>
                    <span>{"Found "}{found}{" / "}{total}</span>
                    <span>{"Score "}{engine.score()}</span>
                </nav>
                <div class="timer">
                    <div class="timer-bar" style={timer_style(engine.time_fraction())}/>
                </div>
                <div class="grid" style={grid_style}>
                    {
                        for (0..grid.total_cells()).map(|index| {
                            let color = grid.color_at(index);
                            let found = engine.is_found(index);
                            let callback = callback.clone();
                            html! {
                                <TileView key={index} {index} {color} {found} {callback}/>
                            }
                        })
                    }
                </div>
            </section>
        }
    }

    fn view_result(&self, ctx: &Context<Self>) -> Html {
        let Some(summary) = self.engine.last_run() else {
            return html! {};
        };
        let cb_retry = ctx.link().callback(|_: MouseEvent| Msg::Retry);
        let cb_main_menu = ctx.link().callback(|_: MouseEvent| Msg::MainMenu);

        html! {
            <section class="result">
                <h2>{result_title(summary.outcome)}</h2>
                <p>{"Final score: "}{summary.score}</p>
                <p>{"Stage reached: "}{summary.stage_reached}</p>
                if let Some(rank) = summary.high_score_rank {
                    <p class="record">{format!("New high score, #{}", rank + 1)}</p>
                }
                <button onclick={cb_retry}>{"Retry"}</button>
                <button onclick={cb_main_menu}>{"Main Menu"}</button>
            </section>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let seed = props.seed.unwrap_or_else(js_random_seed);
        let rules = props.rules();
        log::debug!("seed: {}, rules: {:?}", seed, rules);

        let engine = GameEngine::new(
            game::Campaign::standard(),
            rules,
            seed,
            LocalOrDefault::local_or_default(),
        )
        .expect("Could not create game engine");

        Self {
            engine,
            show_high_scores: false,
            shaking: false,
            last_tick: Instant::now(),
            countdown: None,
            advance: None,
            shake: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            Start | Retry => {
                let epoch = if msg == Retry {
                    self.engine.retry()
                } else {
                    self.engine.start()
                };
                self.show_high_scores = false;
                self.advance = None;
                self.start_countdown(ctx, epoch);
                true
            }
            MainMenu => {
                self.stop_timers();
                self.engine.to_main_menu();
                self.show_high_scores = false;
                true
            }
            ShowHighScores => {
                self.show_high_scores = true;
                true
            }
            TileClick(index) => self.tile_click(ctx, index),
            Tick(epoch) => {
                use game::TickOutcome::*;

                let now = Instant::now();
                let elapsed = now.duration_since(self.last_tick);
                self.last_tick = now;

                match self.engine.tick(epoch, elapsed) {
                    Stale => false,
                    Running => true,
                    Expired => {
                        if let Some(summary) = self.engine.last_run() {
                            self.on_run_finished(summary);
                        }
                        true
                    }
                }
            }
            Advance(token) => {
                use game::AdvanceOutcome::*;

                match self.engine.advance(token) {
                    Stale => false,
                    StageStarted(epoch) => {
                        self.advance = None;
                        self.start_countdown(ctx, epoch);
                        true
                    }
                    Cleared(summary) => {
                        self.on_run_finished(summary);
                        true
                    }
                }
            }
            ShakeDone => {
                self.shake = None;
                self.shaking = false;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let content = match self.screen() {
            Screen::MainMenu => self.view_main_menu(ctx),
            Screen::HighScores => self.view_high_scores(ctx),
            Screen::Game => self.view_game(ctx),
            Screen::Result => self.view_result(ctx),
        };

        html! {
            <div class="chroma-seek">
                {content}
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_label_is_one_based_and_capped() {
        assert_eq!(stage_label(0, 9), "1 / 9");
        assert_eq!(stage_label(8, 9), "9 / 9");
        assert_eq!(stage_label(9, 9), "9 / 9");
    }

    #[test]
    fn timer_style_is_clamped_percentage() {
        assert_eq!(timer_style(1.0), "width: 100.0%");
        assert_eq!(timer_style(0.4567), "width: 45.7%");
        assert_eq!(timer_style(-1.0), "width: 0.0%");
    }

    #[test]
    fn result_titles() {
        assert_eq!(result_title(game::RunOutcome::Cleared), "All Clear!");
        assert_eq!(result_title(game::RunOutcome::Failed), "Game Over");
    }

    #[test]
    fn props_select_rules() {
        let props = GameProps {
            seed: None,
            colors: None,
            penalty: PenaltyArg::Time,
        };
        assert_eq!(props.rules(), game::GameRules::default());

        let props = GameProps {
            seed: Some(3),
            colors: Some(ColorSpaceArg::Rgb),
            penalty: PenaltyArg::Score,
        };
        let rules = props.rules();
        assert_eq!(rules.stage_duration, Duration::from_secs(10));
        assert_eq!(rules.miss_penalty, game::MissPenalty::Score(100));
        assert_eq!(rules.color_space, game::ColorSpace::Rgb);
    }

    #[test]
    fn storage_key_uses_namespaced_slot() {
        assert_eq!(
            <game::HighScores as StorageKey>::KEY,
            "chroma-seek:high-scores"
        );
    }
}
