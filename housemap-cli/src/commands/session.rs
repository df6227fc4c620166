//! Interactive session: one map surface and one list surface sharing the
//! store and the navigation bus, driven line by line from stdin.

use anyhow::Result;
use housemap_core::{
    App, Geolocator, HeadlessMap, ListSurface, MapState, MapSurfaceController, PointEdit, PointId,
    RouteLine, UserPrompt, View,
};
use std::io::{self, Write};
use std::sync::Arc;

use crate::commands::{format_points, format_routes, open_app, parse_lat_lng, parse_path, runtime};
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::terminal::TerminalPrompt;

const HELP: &str = "\
Views:
  map | list | open <path>     switch view (/map, /list)
Map view:
  mark                         mark the current location as visited
  place                        toggle manual placement mode
  click <lat,lng>              tap the map
  draw <lat,lng;lat,lng;...>   draw a route segment
  reshape <index> <path>       replace a route's geometry
  erase <index>...             delete routes
  routes                       list drawn routes
List view:
  edit <id> street|number [value]
  delete <id>
  jump <id>                    show the point on the map
Other:
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

pub struct Session<G, P> {
    map: MapSurfaceController<G, HeadlessMap, Arc<P>>,
    list: ListSurface<Arc<P>>,
    view: View,
}

impl<G: Geolocator, P: UserPrompt> Session<G, P> {
    /// Build both surfaces and construct the map.
    pub async fn open(app: &App, geolocator: G, prompt: P) -> CliResult<Self> {
        let prompt = Arc::new(prompt);
        let mut map = app.map_surface(geolocator, HeadlessMap::new(), prompt.clone());
        map.initialize().await?;
        let list = app.list_surface(prompt);
        Ok(Self { map, list, view: View::Map })
    }

    pub fn view(&self) -> View {
        self.view
    }

    #[cfg(test)]
    pub fn map(&self) -> &MapSurfaceController<G, HeadlessMap, Arc<P>> {
        &self.map
    }

    pub async fn handle(&mut self, line: &str) -> CliResult<Reply> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Reply::Text(String::new()));
        };
        let args: Vec<&str> = words.collect();

        let text = match command {
            "help" => HELP.to_string(),
            "quit" | "exit" => return Ok(Reply::Quit),
            "map" | "list" | "open" => {
                let path = match command {
                    "open" => args.first().copied().unwrap_or(""),
                    view => view,
                };
                match View::from_path(path) {
                    Ok(view) => self.show(view)?,
                    Err(e) => e.to_string(),
                }
            }
            "mark" | "place" | "click" | "draw" | "reshape" | "erase" | "routes"
                if self.view != View::Map =>
            {
                format!("'{}' needs the map view; type 'map' first.", command)
            }
            "edit" | "delete" | "jump" if self.view != View::List => {
                format!("'{}' needs the list view; type 'list' first.", command)
            }
            "mark" => match self.map.mark_current_location().await? {
                Some(point) => format!("Marked point {} at {}", point.id, point.position()),
                None => "No location fix; nothing was marked.".to_string(),
            },
            "place" => {
                if self.map.toggle_placement()? {
                    "Placement mode on; 'click <lat,lng>' to place a point.".to_string()
                } else {
                    "Placement mode off.".to_string()
                }
            }
            "click" => {
                let at = parse_lat_lng(&args.join(""))?;
                match self.map.handle_click(at)? {
                    Some(point) => format!("Placed point {} at {}", point.id, point.position()),
                    None => "Click ignored; placement mode is off.".to_string(),
                }
            }
            "draw" => {
                let index = self.map.route_created(parse_path(&args.join(""))?)?;
                format!("Segment added to route {}", index)
            }
            "reshape" => {
                let Some((index, path)) = args.split_first() else {
                    return Ok(Reply::Text("usage: reshape <index> <path>".to_string()));
                };
                let index = parse_index(index)?;
                let line = RouteLine::new(parse_path(&path.join(""))?)?;
                self.map.route_edited(index, line)?;
                format!("Route {} reshaped", index)
            }
            "erase" => {
                let indices = args.iter().map(|a| parse_index(a)).collect::<CliResult<Vec<_>>>()?;
                let removed = self.map.route_deleted(&indices)?;
                format!("Deleted {} routes", removed)
            }
            "routes" => format_routes(self.map.routes()),
            "edit" => match args.as_slice() {
                [id, field, value @ ..] => {
                    let id = parse_id(id)?;
                    let value = value.join(" ");
                    let edit = match *field {
                        "street" => PointEdit::Street(value),
                        "number" => PointEdit::Number(value),
                        other => return Ok(Reply::Text(format!("Unknown field '{}'", other))),
                    };
                    self.list.edit(id, edit)?;
                    format_points(self.list.points())
                }
                _ => "usage: edit <id> street|number [value]".to_string(),
            },
            "delete" => {
                let id = parse_id(args.first().copied().unwrap_or(""))?;
                if self.list.delete(id)? {
                    format_points(self.list.points())
                } else {
                    format!("Kept point {}", id)
                }
            }
            "jump" => {
                let id = parse_id(args.first().copied().unwrap_or(""))?;
                let view = self.list.jump_to(id)?;
                self.show(view)?
            }
            other => format!("Unknown command '{}'; type 'help'.", other),
        };
        Ok(Reply::Text(text))
    }

    /// Enter a view. The map picks up changes made in the list and any
    /// pending jump; the list reloads from storage.
    fn show(&mut self, view: View) -> CliResult<String> {
        self.view = view;
        match view {
            View::Map => {
                let (added, removed) = self.map.refresh_markers()?;
                let jumps = self.map.process_jumps();
                log::debug!("Map refresh: {} added, {} removed, {} jumps", added, removed, jumps);
                Ok(self.describe_map())
            }
            View::List => Ok(format_points(self.list.activate()?)),
        }
    }

    fn describe_map(&self) -> String {
        let widget = self.map.widget();
        let position = match self.map.state() {
            MapState::Ready { center, zoom } => format!("{} (zoom {})", center, zoom),
            MapState::Uninitialized => "not constructed".to_string(),
        };
        format!(
            "Map at {}: {} markers, {} routes",
            position,
            widget.markers.len(),
            self.map.routes().lines().len()
        )
    }
}

fn parse_id(input: &str) -> CliResult<PointId> {
    input
        .parse()
        .map_err(|_| CliError::map(format!("'{}' is not a point id", input)))
}

fn parse_index(input: &str) -> CliResult<usize> {
    input
        .parse()
        .map_err(|_| CliError::route(format!("'{}' is not a route index", input)))
}

pub fn execute(config: &Config, assume_yes: bool) -> Result<()> {
    let app = open_app(config)?;
    let rt = runtime()?;
    let prompt = TerminalPrompt::new(assume_yes);
    let mut session = rt.block_on(Session::open(&app, config.geolocator(None), prompt))?;
    println!("{}", session.describe_map());
    println!("Type 'help' for commands.");

    let stdin = io::stdin();
    loop {
        print!("{}> ", session.view().path());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        match rt.block_on(session.handle(&line)) {
            Ok(Reply::Quit) => break,
            Ok(Reply::Text(text)) if text.is_empty() => {}
            Ok(Reply::Text(text)) => println!("{}", text),
            Err(e @ CliError::Storage { .. }) => return Err(e.into()),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    log::info!("Session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::ConfiguredGeolocator;
    use housemap_core::{FixedGeolocator, LatLng, MapSettings, MemoryStore, RecordingPrompt};

    async fn session(app: &App) -> Session<ConfiguredGeolocator, RecordingPrompt> {
        let geo = ConfiguredGeolocator::Fixed(FixedGeolocator::new(LatLng::new(10.0, 20.0)));
        Session::open(app, geo, RecordingPrompt::new(true)).await.unwrap()
    }

    fn text(reply: CliResult<Reply>) -> String {
        match reply.unwrap() {
            Reply::Text(text) => text,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn test_commands_are_scoped_to_views() {
        let app = App::new(Arc::new(MemoryStore::new()), MapSettings::default());
        let mut s = session(&app).await;
        assert_eq!(s.view(), View::Map);
        assert!(text(s.handle("jump 1").await).contains("needs the list view"));
        assert_eq!(s.handle("quit").await.unwrap(), Reply::Quit);
        assert!(text(s.handle("open /nowhere").await).contains("Unknown view path"));
    }

    #[tokio::test]
    async fn test_list_jump_moves_map() {
        let app = App::new(Arc::new(MemoryStore::new()), MapSettings::default());
        let mut s = session(&app).await;

        assert!(text(s.handle("mark").await).starts_with("Marked point"));
        let id = app.points().list().unwrap()[0].id;

        let table = text(s.handle("list").await);
        assert!(table.contains(&id.to_string()));
        text(s.handle(&format!("edit {} street Main Street", id)).await);
        assert_eq!(app.points().get(id).unwrap().unwrap().street.as_deref(), Some("Main Street"));

        let summary = text(s.handle(&format!("jump {}", id)).await);
        assert_eq!(s.view(), View::Map);
        assert!(summary.contains("1 markers"));
        // One flight for the mark, one for the jump.
        assert_eq!(s.map().widget().flights.len(), 2);
        assert_eq!(s.map().widget().flights.last(), Some(&(LatLng::new(10.0, 20.0), 16.0)));
        assert_eq!(app.nav().current(), None);
    }

    #[tokio::test]
    async fn test_list_edit_updates_map_popup() {
        let app = App::new(Arc::new(MemoryStore::new()), MapSettings::default());
        let mut s = session(&app).await;
        text(s.handle("mark").await);
        let id = app.points().list().unwrap()[0].id;

        text(s.handle("list").await);
        text(s.handle(&format!("edit {} street Main Street", id)).await);
        text(s.handle("map").await);

        let marker = s.map().widget().marker(id).expect("marker");
        assert!(marker.popup.contains("Main Street"));
        assert_eq!(s.map().widget().markers.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_in_list_removes_marker_on_return() {
        let app = App::new(Arc::new(MemoryStore::new()), MapSettings::default());
        let mut s = session(&app).await;
        text(s.handle("place").await);
        text(s.handle("click 1.5, 2.5").await);
        assert_eq!(s.map().widget().markers.len(), 1);

        let id = app.points().list().unwrap()[0].id;
        text(s.handle("list").await);
        assert_eq!(text(s.handle(&format!("delete {}", id)).await), "No visited points.");
        text(s.handle("map").await);
        assert!(s.map().widget().markers.is_empty());
    }

    #[tokio::test]
    async fn test_route_commands() {
        let app = App::new(Arc::new(MemoryStore::new()), MapSettings::default());
        let mut s = session(&app).await;
        assert_eq!(text(s.handle("draw 0,0;0,1").await), "Segment added to route 0");
        assert_eq!(text(s.handle("draw 1,1; 1,2").await), "Segment added to route 0");
        assert!(matches!(s.handle("draw 1,1").await, Err(CliError::Route { .. })));
        assert_eq!(text(s.handle("routes").await), "Route 0 (current): 2 segment(s), 4 points");
        text(s.handle("reshape 0 5,5;5,6;5,7").await);
        assert_eq!(text(s.handle("erase 0").await), "Deleted 1 routes");
        assert!(app.routes().load().unwrap().unwrap().is_empty());
    }
}
