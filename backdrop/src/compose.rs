//! # Background composition
//! The workflows that put something new behind (or under) the scene: a solid
//! color, a stock image, an AI-generated backdrop from a prompt, and the
//! subject's own background removed. Each one ends, on success, with a
//! repaint and a new history entry - backgrounds are ordinary edits as far as
//! undo is concerned.
//!
//! Image-backed workflows run in two phases. The fetch/decode phase runs
//! *outside* the editor lock, so slow network work never freezes edits or
//! history, and several requests may be in flight at once. The commit phase
//! then takes the lock and applies the result. Because responses can arrive
//! out of order, every request takes a numbered ticket at entry and the
//! commit phase only applies the holder of the *newest* ticket; anything
//! older reports [`BackgroundOutcome::Superseded`] and leaves no trace. The
//! user's latest choice wins, regardless of which download finished first.
//!
//! History steps take no ticket: an undo racing a pending request does not
//! cancel it, and the request - still the newest expressed intent - commits
//! on top when it lands.
//!
//! Failures follow one rule: a workflow that cannot finish leaves the scene
//! and history exactly as they were. Collaborator errors surface as
//! [`ComposeError`] values, never panics.

use backdrop_core::color::Color;
use backdrop_core::placement::{cover, PlacementError};
use backdrop_core::scene::{find_subject, BackgroundImage, ObjectKind, ObjectState};
use backdrop_core::snapshot::Snapshot;
use backdrop_core::source::{Directive, ImageSource};

use crate::editor::{Editor, Shared};
use crate::surface::{ImageLoader, LoadedImage, Surface};

/// What to put behind the scene.
#[derive(Clone, PartialEq, Debug, strum::AsRefStr)]
pub enum BackgroundRequest {
    /// Fill the color layer. An existing background image is left alone -
    /// the color shows wherever the image does not cover.
    Color(Color),
    /// Drop both background layers back to nothing.
    Clear,
    /// A finished image, typically a stock-search pick. Cover-fitted to the
    /// canvas.
    StockImage { source: ImageSource },
    /// Ask the subject's CDN to generate a backdrop from a prompt, then
    /// cover-fit the result.
    AiPrompt { prompt: String },
}

/// How a background workflow ended when it did not fail outright.
#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::AsRefStr)]
pub enum BackgroundOutcome {
    /// The scene changed and a new state was recorded.
    Applied,
    /// A newer request overtook this one. Nothing changed, nothing recorded.
    Superseded,
    /// The subject is hosted somewhere that cannot run server-side
    /// transforms. Nothing changed; the host decides how to break the news.
    TransformUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// AI workflows anchor on the primary subject, and the canvas has no
    /// image to anchor on.
    #[error("no image on the canvas to work from")]
    NoSubjectFound,
    /// The loader could not fetch or decode an image. Retryable.
    #[error("failed to fetch {url}: {source}")]
    ResourceFetch {
        url: String,
        #[source]
        source: crate::BoxedError,
    },
    /// A decoded image reported a size that cannot be placed. A defect in
    /// the loader or host, not something a retry fixes.
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// Generation stamp of one background request. Compared against the editor's
/// epoch at commit time; see the module docs.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct Ticket(u64);
impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bg#{}", self.0)
    }
}

impl<S: Surface, L: ImageLoader> Editor<S, L> {
    fn take_ticket(&self) -> Ticket {
        Ticket(
            self.epoch
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
                + 1,
        )
    }
    fn ticket_is_current(&self, ticket: Ticket) -> bool {
        self.epoch.load(std::sync::atomic::Ordering::SeqCst) == ticket.0
    }

    /// Run one background workflow to completion. See the module docs for
    /// the phase and supersession rules.
    pub async fn apply_background(
        &self,
        request: BackgroundRequest,
    ) -> Result<BackgroundOutcome, ComposeError> {
        let ticket = self.take_ticket();
        self.pending
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        // Every exit path - applied, superseded, failed - is a completion.
        let _pending = defer::defer(|| {
            self.pending
                .fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
        });
        log::debug!("{ticket}: {} requested", request.as_ref());

        match request {
            BackgroundRequest::Color(color) => {
                self.commit_background(ticket, |surface| {
                    surface.set_background_color(Some(color));
                    Ok(())
                })
                .await
            }
            BackgroundRequest::Clear => {
                self.commit_background(ticket, |surface| {
                    surface.set_background_color(None);
                    surface.set_background_image(None);
                    Ok(())
                })
                .await
            }
            BackgroundRequest::StockImage { source } => {
                let image = self.fetch(&source).await?;
                self.commit_cover(ticket, image).await
            }
            BackgroundRequest::AiPrompt { prompt } => {
                let subject_source = self.subject_source().await?;
                let directive = Directive::ChangeBackground { prompt };
                let Some(derived) = subject_source.transformed(&directive) else {
                    log::warn!(
                        "{ticket}: {} host cannot generate backgrounds",
                        subject_source.host().as_ref()
                    );
                    return Ok(BackgroundOutcome::TransformUnavailable);
                };
                let image = self.fetch(&derived).await?;
                self.commit_cover(ticket, image).await
            }
        }
    }

    /// Replace the primary subject with a rendition whose background the CDN
    /// has cut away. The subject keeps its placement verbatim - same spot,
    /// same scale, same angle, same slot in paint order.
    pub async fn remove_subject_background(&self) -> Result<BackgroundOutcome, ComposeError> {
        let ticket = self.take_ticket();
        self.pending
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let _pending = defer::defer(|| {
            self.pending
                .fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
        });
        log::debug!("{ticket}: background removal requested");

        let (subject_id, subject_source) = {
            let shared = self.shared.lock().await;
            let objects = shared.surface.objects();
            let Some(subject) = find_subject(&objects) else {
                return Err(ComposeError::NoSubjectFound);
            };
            // Unwrap OK - find_subject only ever returns images.
            (
                subject.id,
                subject.state.kind.image_source().unwrap().clone(),
            )
        };
        let Some(derived) = subject_source.transformed(&Directive::RemoveBackground) else {
            log::warn!(
                "{ticket}: {} host cannot remove backgrounds",
                subject_source.host().as_ref()
            );
            return Ok(BackgroundOutcome::TransformUnavailable);
        };
        let image = self.fetch(&derived).await?;

        self.commit_background(ticket, move |surface| {
            // Look the subject up again - the scene may have moved while the
            // CDN worked, and a restore hands out fresh object handles.
            let objects = surface.objects();
            let Some(live) = objects.iter().find(|object| object.id == subject_id) else {
                return Err(ComposeError::NoSubjectFound);
            };
            let replacement = ObjectState {
                kind: ObjectKind::Image {
                    source: image.source,
                },
                placement: live.state.placement,
            };
            surface.replace_object(subject_id, replacement);
            Ok(())
        })
        .await
    }

    /// The primary subject's image source, or the error every AI workflow
    /// reports without one.
    async fn subject_source(&self) -> Result<ImageSource, ComposeError> {
        let shared = self.shared.lock().await;
        let objects = shared.surface.objects();
        let Some(subject) = find_subject(&objects) else {
            return Err(ComposeError::NoSubjectFound);
        };
        // Unwrap OK - find_subject only ever returns images.
        Ok(subject.state.kind.image_source().unwrap().clone())
    }

    async fn fetch(&self, source: &ImageSource) -> Result<LoadedImage, ComposeError> {
        self.loader
            .load(source)
            .await
            .map_err(|err| ComposeError::ResourceFetch {
                url: source.url().to_owned(),
                source: err,
            })
    }

    /// Commit phase: cover-fit a fetched image behind the whole canvas.
    async fn commit_cover(
        &self,
        ticket: Ticket,
        image: LoadedImage,
    ) -> Result<BackgroundOutcome, ComposeError> {
        self.commit_background(ticket, move |surface| {
            // Canvas size is read here, under the lock, so a resize that
            // landed mid-download is accounted for.
            let fit = match cover(surface.canvas_size(), image.natural_size) {
                Ok(fit) => fit,
                Err(err) => {
                    log::error!("{ticket}: unplaceable image from {}: {err}", image.source);
                    return Err(err.into());
                }
            };
            surface.set_background_image(Some(BackgroundImage {
                source: image.source,
                placement: fit.placement(),
            }));
            Ok(())
        })
        .await
    }

    /// Shared commit phase. Checks ticket currency, runs the scene mutation,
    /// repaints, records.
    ///
    /// Closures must fail before their first surface call if they fail at
    /// all - an `Err` out of here promises an untouched scene.
    async fn commit_background(
        &self,
        ticket: Ticket,
        f: impl FnOnce(&mut S) -> Result<(), ComposeError>,
    ) -> Result<BackgroundOutcome, ComposeError> {
        let mut shared = self.shared.lock().await;
        if !self.ticket_is_current(ticket) {
            log::warn!("{ticket}: superseded by a newer request, dropping response");
            return Ok(BackgroundOutcome::Superseded);
        }
        let Shared { surface, timeline } = &mut *shared;
        f(surface)?;
        surface.request_repaint();
        timeline.record(Snapshot::capture(surface.serialize()));
        log::debug!("{ticket}: applied and recorded");
        Ok(BackgroundOutcome::Applied)
    }
}

#[cfg(test)]
mod test {
    use super::{BackgroundOutcome, BackgroundRequest, ComposeError};
    use crate::editor::Editor;
    use crate::headless::{HeadlessLoader, HeadlessSurface};
    use crate::surface::{ImageLoader, LoadedImage, Surface};
    use backdrop_core::color::Color;
    use backdrop_core::scene::{
        ObjectKind, ObjectState, OriginX, OriginY, Placement, SceneObject,
    };
    use backdrop_core::source::{ImageHost, ImageSource};

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
    fn image_object(url: &str, host: ImageHost, placement: Placement) -> SceneObject {
        SceneObject::new(ObjectState {
            kind: ObjectKind::Image {
                source: ImageSource::new(url, host),
            },
            placement,
        })
    }
    fn text_object(content: &str) -> SceneObject {
        SceneObject::new(ObjectState {
            kind: ObjectKind::Text {
                content: content.to_owned(),
                size: 24.0,
                fill: Color::BLACK,
            },
            placement: Placement::default(),
        })
    }
    /// 800x600 session over the given loader, objects bottom-up in order.
    fn session_with<L: ImageLoader>(
        loader: L,
        objects: Vec<SceneObject>,
    ) -> Editor<HeadlessSurface, L> {
        let mut surface = HeadlessSurface::new(800.0, 600.0);
        for object in objects {
            surface.add_object(object);
        }
        Editor::open(surface, loader)
    }
    fn stock(url: &str) -> BackgroundRequest {
        BackgroundRequest::StockImage {
            source: ImageSource::new(url, ImageHost::Plain),
        }
    }

    /// Loader that parks a chosen URL behind a few scheduler yields, so one
    /// request can overtake another deterministically on the test runtime.
    struct StallingLoader {
        inner: HeadlessLoader,
        stall_url: String,
        stall_polls: usize,
    }
    #[async_trait::async_trait]
    impl ImageLoader for StallingLoader {
        async fn load(&self, source: &ImageSource) -> Result<LoadedImage, crate::BoxedError> {
            if source.url() == self.stall_url {
                for _ in 0..self.stall_polls {
                    tokio::task::yield_now().await;
                }
            }
            self.inner.load(source).await
        }
    }

    #[tokio::test]
    async fn color_fills_only_the_color_layer() {
        init_logs();
        let mut loader = HeadlessLoader::new();
        loader.register("https://stock.example/beach.jpg", [400.0, 200.0]);
        let editor = session_with(loader, vec![]);

        editor
            .apply_background(stock("https://stock.example/beach.jpg"))
            .await
            .unwrap();
        let outcome = editor
            .apply_background(BackgroundRequest::Color(Color::rgb(0x20, 0x30, 0x40)))
            .await
            .unwrap();
        assert_eq!(outcome, BackgroundOutcome::Applied);

        let live = editor.inspect(|surface| surface.serialize()).await;
        assert_eq!(live.background.color, Some(Color::rgb(0x20, 0x30, 0x40)));
        // The image layer survived the color change.
        assert!(live.background.image.is_some());
        assert_eq!(editor.history_depth().await, 3);
    }
    #[tokio::test]
    async fn clear_drops_both_layers() {
        let mut loader = HeadlessLoader::new();
        loader.register("https://stock.example/beach.jpg", [400.0, 200.0]);
        let editor = session_with(loader, vec![]);

        editor
            .apply_background(BackgroundRequest::Color(Color::WHITE))
            .await
            .unwrap();
        editor
            .apply_background(stock("https://stock.example/beach.jpg"))
            .await
            .unwrap();
        let outcome = editor
            .apply_background(BackgroundRequest::Clear)
            .await
            .unwrap();
        assert_eq!(outcome, BackgroundOutcome::Applied);

        let live = editor.inspect(|surface| surface.serialize()).await;
        assert!(live.background.color.is_none());
        assert!(live.background.image.is_none());
        // Clearing is an edit like any other: one entry per applied request.
        assert_eq!(editor.history_depth().await, 4);
    }
    #[tokio::test]
    async fn stock_image_is_cover_fitted_and_undoable() {
        let mut loader = HeadlessLoader::new();
        loader.register("https://stock.example/forest.jpg", [400.0, 200.0]);
        let editor = session_with(loader, vec![]);
        let pristine = editor.current().await.unwrap();

        editor
            .apply_background(stock("https://stock.example/forest.jpg"))
            .await
            .unwrap();

        let live = editor.inspect(|surface| surface.serialize()).await;
        let background = live.background.image.expect("background image set");
        assert_eq!(background.source.url(), "https://stock.example/forest.jpg");
        // 800/400 = 2, 600/200 = 3: height governs, centered on the canvas.
        assert_eq!(background.placement.scale_x, 3.0);
        assert_eq!(background.placement.scale_y, 3.0);
        assert_eq!(background.placement.left, 400.0);
        assert_eq!(background.placement.top, 300.0);
        assert_eq!(background.placement.origin_x, OriginX::Center);
        assert_eq!(background.placement.origin_y, OriginY::Center);

        // One undo peels the background back off.
        editor.undo().await.unwrap();
        assert_eq!(editor.current().await.unwrap(), pristine);
        let live = editor.inspect(|surface| surface.serialize()).await;
        assert!(live.background.image.is_none());
    }
    #[tokio::test]
    async fn ai_prompt_derives_fetches_and_applies() {
        init_logs();
        let mut loader = HeadlessLoader::new();
        // The loader only answers at the derived directive URL - reaching it
        // proves the strip-and-append derivation ran.
        loader.register(
            "https://cdn.example.com/shoot/subject.png?tr=e-changebg-prompt-sunset+beach",
            [1600.0, 1200.0],
        );
        let subject = image_object(
            "https://cdn.example.com/shoot/subject.png?tr=w-1200",
            ImageHost::DirectiveCdn,
            Placement::default(),
        );
        let editor = session_with(loader, vec![subject]);

        let outcome = editor
            .apply_background(BackgroundRequest::AiPrompt {
                prompt: "sunset beach".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, BackgroundOutcome::Applied);

        let live = editor.inspect(|surface| surface.serialize()).await;
        let background = live.background.image.expect("background image set");
        assert_eq!(
            background.source.url(),
            "https://cdn.example.com/shoot/subject.png?tr=e-changebg-prompt-sunset+beach"
        );
        assert_eq!(background.placement.scale_x, 0.5);
        // The subject itself was not touched.
        assert_eq!(live.objects.len(), 1);
        assert_eq!(
            live.objects[0].kind.image_source().unwrap().url(),
            "https://cdn.example.com/shoot/subject.png?tr=w-1200"
        );
    }
    #[tokio::test]
    async fn ai_prompt_needs_a_subject() {
        let editor = session_with(HeadlessLoader::new(), vec![text_object("words only")]);
        let err = editor
            .apply_background(BackgroundRequest::AiPrompt {
                prompt: "anything".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::NoSubjectFound));
        assert_eq!(editor.history_depth().await, 1);
        assert_eq!(editor.pending_backgrounds(), 0);
    }
    #[tokio::test]
    async fn plain_host_cannot_transform() {
        let subject = image_object(
            "https://files.example.com/upload.png",
            ImageHost::Plain,
            Placement::default(),
        );
        let editor = session_with(HeadlessLoader::new(), vec![subject]);
        let before = editor.inspect(|surface| surface.serialize()).await;

        let outcome = editor
            .apply_background(BackgroundRequest::AiPrompt {
                prompt: "alpine lake".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, BackgroundOutcome::TransformUnavailable);
        let removal = editor.remove_subject_background().await.unwrap();
        assert_eq!(removal, BackgroundOutcome::TransformUnavailable);

        // Declined cleanly: no edit, no history entry.
        assert_eq!(editor.inspect(|surface| surface.serialize()).await, before);
        assert_eq!(editor.history_depth().await, 1);
    }
    #[tokio::test]
    async fn removal_preserves_placement_verbatim() {
        let mut loader = HeadlessLoader::new();
        loader.register(
            "https://cdn.example.com/shoot/subject.png?tr=e-bgremove",
            [500.0, 500.0],
        );
        let placement = Placement {
            left: 10.0,
            top: 20.0,
            scale_x: 1.5,
            scale_y: 1.5,
            angle: 15.0,
            ..Placement::default()
        };
        let subject = image_object(
            "https://cdn.example.com/shoot/subject.png?tr=w-1200",
            ImageHost::DirectiveCdn,
            placement,
        );
        let editor = session_with(loader, vec![subject, text_object("caption")]);

        let outcome = editor.remove_subject_background().await.unwrap();
        assert_eq!(outcome, BackgroundOutcome::Applied);

        let live = editor.inspect(|surface| surface.serialize()).await;
        // Same slot in paint order, same count.
        assert_eq!(live.objects.len(), 2);
        let replaced = &live.objects[0];
        assert_eq!(
            replaced.kind.image_source().unwrap().url(),
            "https://cdn.example.com/shoot/subject.png?tr=e-bgremove"
        );
        assert_eq!(replaced.placement, placement);
        assert_eq!(editor.history_depth().await, 2);
    }
    #[tokio::test]
    async fn fetch_failure_changes_nothing() {
        let editor = session_with(HeadlessLoader::new(), vec![]);
        let err = editor
            .apply_background(stock("https://stock.example/missing.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::ResourceFetch { .. }));
        assert_eq!(editor.history_depth().await, 1);
        assert_eq!(editor.pending_backgrounds(), 0);
        let live = editor.inspect(|surface| surface.serialize()).await;
        assert!(live.background.image.is_none());
    }
    #[tokio::test]
    async fn stale_response_is_dropped() {
        init_logs();
        let mut inner = HeadlessLoader::new();
        inner.register("https://stock.example/slow.jpg", [100.0, 100.0]);
        let loader = StallingLoader {
            inner,
            stall_url: "https://stock.example/slow.jpg".to_owned(),
            stall_polls: 4,
        };
        let editor = session_with(loader, vec![]);

        // First request stalls in its fetch; the second overtakes and
        // commits. The straggler must land in the bin, not on the canvas.
        let (slow, fast) = tokio::join!(
            editor.apply_background(stock("https://stock.example/slow.jpg")),
            editor.apply_background(BackgroundRequest::Color(Color::rgb(9, 9, 9))),
        );
        assert_eq!(slow.unwrap(), BackgroundOutcome::Superseded);
        assert_eq!(fast.unwrap(), BackgroundOutcome::Applied);

        let live = editor.inspect(|surface| surface.serialize()).await;
        assert_eq!(live.background.color, Some(Color::rgb(9, 9, 9)));
        assert!(live.background.image.is_none());
        // Exactly one completed request, exactly one new entry.
        assert_eq!(editor.history_depth().await, 2);
        assert_eq!(editor.pending_backgrounds(), 0);
    }
    #[tokio::test]
    async fn sequential_requests_all_apply() {
        let mut loader = HeadlessLoader::new();
        loader.register("https://stock.example/a.jpg", [800.0, 600.0]);
        loader.register("https://stock.example/b.jpg", [800.0, 600.0]);
        let editor = session_with(loader, vec![]);

        let first = editor
            .apply_background(stock("https://stock.example/a.jpg"))
            .await
            .unwrap();
        let second = editor
            .apply_background(stock("https://stock.example/b.jpg"))
            .await
            .unwrap();
        assert_eq!(first, BackgroundOutcome::Applied);
        assert_eq!(second, BackgroundOutcome::Applied);

        let live = editor.inspect(|surface| surface.serialize()).await;
        assert_eq!(
            live.background.image.unwrap().source.url(),
            "https://stock.example/b.jpg"
        );
        assert_eq!(editor.history_depth().await, 3);
    }
    #[tokio::test]
    async fn removal_notices_a_vanished_subject() {
        let mut inner = HeadlessLoader::new();
        inner.register(
            "https://cdn.example.com/shoot/subject.png?tr=e-bgremove",
            [500.0, 500.0],
        );
        let loader = StallingLoader {
            inner,
            stall_url: "https://cdn.example.com/shoot/subject.png?tr=e-bgremove".to_owned(),
            stall_polls: 4,
        };
        let subject = image_object(
            "https://cdn.example.com/shoot/subject.png",
            ImageHost::DirectiveCdn,
            Placement::default(),
        );
        let subject_id = subject.id;
        let editor = session_with(loader, vec![subject]);

        // While the CDN grinds away, the user deletes the subject.
        let (removal, ()) = tokio::join!(editor.remove_subject_background(), async {
            editor
                .edit(|surface| {
                    surface.remove_object(subject_id);
                })
                .await;
        });
        assert!(matches!(
            removal.unwrap_err(),
            ComposeError::NoSubjectFound
        ));

        // Only the deletion recorded; the orphaned response left no trace.
        assert_eq!(editor.history_depth().await, 2);
        let live = editor.inspect(|surface| surface.serialize()).await;
        assert!(live.objects.is_empty());
        assert_eq!(editor.pending_backgrounds(), 0);
    }
}
