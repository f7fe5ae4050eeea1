//! Regression coverage for the challenge engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{ChallengeId, ErrorCode, SessionId, UserId};

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0)
        .single()
        .expect("valid fixture time")
        + Duration::minutes(minutes)
}

fn draft(max_participants: u32, unit: ChallengeUnit) -> NewChallenge {
    NewChallenge {
        title: "Spring scales".to_owned(),
        description: String::new(),
        challenge_type: ChallengeType::Weekly,
        category: "technique".to_owned(),
        requirement: ChallengeRequirement { target: 100.0, unit },
        settings: ChallengeSettings {
            max_participants,
            ..ChallengeSettings::default()
        },
        schedule: ChallengeSchedule {
            starts_at: at(0),
            ends_at: at(7 * 24 * 60),
        },
        rewards: RewardTable {
            first: PlaceReward {
                xp: 300,
                badge: Some("gold".to_owned()),
                title: Some("Champion".to_owned()),
            },
            second: PlaceReward {
                xp: 200,
                ..PlaceReward::default()
            },
            third: PlaceReward {
                xp: 100,
                ..PlaceReward::default()
            },
            participation: PlaceReward {
                xp: 25,
                ..PlaceReward::default()
            },
        },
    }
}

fn build(max_participants: u32, unit: ChallengeUnit) -> Challenge {
    Challenge::create(
        ChallengeId::random(),
        UserId::random(),
        draft(max_participants, unit),
        at(-60),
    )
    .expect("valid challenge")
}

fn published() -> Challenge {
    let mut challenge = build(3, ChallengeUnit::Points);
    challenge.publish(at(-30)).expect("publish");
    challenge
}

#[fixture]
fn pending() -> Challenge {
    published()
}

#[fixture]
fn active() -> Challenge {
    let mut challenge = published();
    challenge.start(at(0)).expect("start");
    challenge
}

fn users(count: usize) -> Vec<UserId> {
    (0..count).map(|_| UserId::random()).collect()
}

fn assert_leaderboard_invariant(challenge: &Challenge) {
    let board = challenge.leaderboard();
    assert_eq!(board.len(), challenge.participants().len());
    for (index, entry) in board.iter().enumerate() {
        assert_eq!(entry.rank as usize, index + 1);
    }
    for pair in board.windows(2) {
        assert!(pair[0].progress >= pair[1].progress);
        if pair[0].progress == pair[1].progress {
            let first = challenge.participant(&pair[0].user_id).expect("ranked participant");
            let second = challenge.participant(&pair[1].user_id).expect("ranked participant");
            assert!(first.joined_at <= second.joined_at);
        }
    }
}

#[rstest]
#[case(NewChallenge { title: " ".to_owned(), ..draft(3, ChallengeUnit::Points) })]
#[case(NewChallenge { requirement: ChallengeRequirement { target: 0.0, unit: ChallengeUnit::Points }, ..draft(3, ChallengeUnit::Points) })]
#[case(draft(0, ChallengeUnit::Points))]
#[case(NewChallenge { schedule: ChallengeSchedule { starts_at: at(10), ends_at: at(10) }, ..draft(3, ChallengeUnit::Points) })]
fn create_rejects_invalid_drafts(#[case] input: NewChallenge) {
    let result = Challenge::create(ChallengeId::random(), UserId::random(), input, at(0));
    assert!(matches!(result, Err(ChallengeError::Validation(_))));
}

#[rstest]
fn creator_is_not_enrolled_automatically() {
    let challenge = build(3, ChallengeUnit::Points);
    assert_eq!(challenge.status(), ChallengeStatus::Draft);
    assert!(challenge.participants().is_empty());
}

#[rstest]
fn lifecycle_follows_draft_pending_active_completed() {
    let mut challenge = build(3, ChallengeUnit::Points);
    assert!(matches!(
        challenge.start(at(0)),
        Err(ChallengeError::InvalidTransition {
            action: ChallengeAction::Start,
            status: ChallengeStatus::Draft,
        })
    ));
    assert!(challenge.complete(at(0)).is_err());

    challenge.publish(at(0)).expect("publish");
    challenge.start(at(1)).expect("start");
    challenge.complete(at(2)).expect("complete");
    assert_eq!(challenge.status(), ChallengeStatus::Completed);
    assert!(challenge.cancel(at(3)).is_err());
}

#[rstest]
#[case(ChallengeStatus::Draft)]
#[case(ChallengeStatus::Pending)]
#[case(ChallengeStatus::Active)]
fn cancel_is_reachable_from_non_terminal_states(#[case] status: ChallengeStatus) {
    let mut challenge = build(3, ChallengeUnit::Points);
    if status != ChallengeStatus::Draft {
        challenge.publish(at(0)).expect("publish");
    }
    if status == ChallengeStatus::Active {
        challenge.start(at(0)).expect("start");
    }
    challenge.cancel(at(1)).expect("cancel");
    assert_eq!(challenge.status(), ChallengeStatus::Cancelled);
}

#[rstest]
fn refresh_auto_starts_due_challenges() {
    let mut input = draft(3, ChallengeUnit::Points);
    input.settings.auto_start = true;
    let mut challenge =
        Challenge::create(ChallengeId::random(), UserId::random(), input, at(-60)).expect("valid");
    challenge.publish(at(-30)).expect("publish");

    assert!(!challenge.refresh(at(-1)));
    assert!(challenge.refresh(at(0)));
    assert_eq!(challenge.status(), ChallengeStatus::Active);
    assert!(!challenge.refresh(at(1)));
}

#[rstest]
fn join_at_capacity_is_always_full(mut pending: Challenge) {
    let members = users(3);
    for (offset, user) in members.iter().enumerate() {
        pending.join(user, at(offset as i64)).expect("join");
    }

    let outsider = UserId::random();
    assert_eq!(
        pending.join(&outsider, at(10)),
        Err(ChallengeError::ChallengeFull { max_participants: 3 })
    );
    assert_eq!(
        pending.join(&members[0], at(10)),
        Err(ChallengeError::ChallengeFull { max_participants: 3 })
    );
    assert_eq!(pending.participants().len(), 3);
    assert_eq!(pending.stats().total_participants, 3);
}

#[rstest]
fn join_twice_is_already_joined(mut pending: Challenge) {
    let user = UserId::random();
    pending.join(&user, at(0)).expect("join");
    assert_eq!(
        pending.join(&user, at(1)),
        Err(ChallengeError::AlreadyJoined {
            user_id: user.clone()
        })
    );
}

#[rstest]
#[case(false, false)]
#[case(true, true)]
fn private_or_approval_challenges_require_invitations(
    #[case] is_public: bool,
    #[case] require_approval: bool,
) {
    let mut input = draft(3, ChallengeUnit::Points);
    input.settings.is_public = is_public;
    input.settings.require_approval = require_approval;
    let mut challenge =
        Challenge::create(ChallengeId::random(), UserId::random(), input, at(0)).expect("valid");
    challenge.publish(at(0)).expect("publish");

    assert_eq!(
        challenge.join(&UserId::random(), at(1)),
        Err(ChallengeError::InvitationRequired)
    );
}

#[rstest]
fn leave_before_start_removes_participant(mut pending: Challenge) {
    let user = UserId::random();
    pending.join(&user, at(0)).expect("join");
    pending.leave(&user, at(1)).expect("leave");
    assert!(pending.participants().is_empty());
    assert_eq!(pending.stats().total_participants, 0);
    assert_eq!(
        pending.leave(&user, at(2)),
        Err(ChallengeError::NotParticipant { user_id: user })
    );
}

#[rstest]
fn leave_is_forbidden_once_active(mut pending: Challenge) {
    let user = UserId::random();
    pending.join(&user, at(0)).expect("join");
    pending.start(at(1)).expect("start");
    assert!(matches!(
        pending.leave(&user, at(2)),
        Err(ChallengeError::InvalidTransition {
            action: ChallengeAction::Leave,
            ..
        })
    ));
}

#[rstest]
fn update_progress_requires_active(mut pending: Challenge) {
    let user = UserId::random();
    pending.join(&user, at(0)).expect("join");
    assert!(matches!(
        pending.update_progress(&user, 5.0, at(1)),
        Err(ChallengeError::InvalidTransition { .. })
    ));
}

#[rstest]
#[case(-1.0)]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
fn update_progress_rejects_invalid_values(mut active: Challenge, #[case] value: f64) {
    let user = UserId::random();
    active.join(&user, at(0)).expect("join");
    assert!(matches!(
        active.update_progress(&user, value, at(1)),
        Err(ChallengeError::InvalidProgress { .. })
    ));
}

#[rstest]
fn update_progress_is_last_write_wins_and_completes_once(mut active: Challenge) {
    let user = UserId::random();
    active.join(&user, at(0)).expect("join");

    active.update_progress(&user, 120.0, at(5)).expect("update");
    active.update_progress(&user, 40.0, at(6)).expect("update");

    let participant = active.participant(&user).expect("participant");
    assert!((participant.progress - 40.0).abs() < f64::EPSILON);
    assert!(participant.completed);
    assert_eq!(participant.completed_at, Some(at(5)));
    assert_eq!(active.stats().completed_participants, 1);
}

#[rstest]
fn leaderboard_orders_by_progress_then_join_time(mut active: Challenge) {
    let members = users(3);
    for (offset, user) in members.iter().enumerate() {
        active.join(user, at(offset as i64)).expect("join");
    }
    active.update_progress(&members[2], 50.0, at(10)).expect("update");
    active.update_progress(&members[0], 30.0, at(11)).expect("update");
    active.update_progress(&members[1], 30.0, at(12)).expect("update");

    let order: Vec<_> = active
        .leaderboard()
        .iter()
        .map(|entry| entry.user_id.clone())
        .collect();
    assert_eq!(order, vec![
        members[2].clone(),
        members[0].clone(),
        members[1].clone()
    ]);
    assert_leaderboard_invariant(&active);
    assert!((active.stats().average_progress - 110.0 / 3.0).abs() < 1e-9);
}

#[rstest]
fn leaderboard_invariant_holds_across_updates(mut active: Challenge) {
    let members = users(3);
    for (offset, user) in members.iter().enumerate() {
        active.join(user, at(offset as i64)).expect("join");
    }
    let values = [10.0, 0.0, 10.0, 75.0, 75.0, 3.5, 0.0, 99.0, 10.0];
    for (step, value) in values.iter().enumerate() {
        let user = &members[step % members.len()];
        active
            .update_progress(user, *value, at(20 + step as i64))
            .expect("update");
        assert_leaderboard_invariant(&active);
    }
}

#[rstest]
fn empty_challenge_has_zero_average(active: Challenge) {
    assert_eq!(active.stats().average_progress, 0.0);
    assert!(active.leaderboard().is_empty());
}

#[rstest]
fn invite_checks_settings_and_membership() {
    let mut input = draft(3, ChallengeUnit::Points);
    input.settings.allow_invites = false;
    let mut closed =
        Challenge::create(ChallengeId::random(), UserId::random(), input, at(0)).expect("valid");
    let creator = closed.creator_id().clone();
    assert_eq!(
        closed.invite(&creator, &UserId::random(), at(1)),
        Err(ChallengeError::InvitesDisabled)
    );

    let mut open = published();
    let stranger = UserId::random();
    assert!(matches!(
        open.invite(&stranger, &UserId::random(), at(1)),
        Err(ChallengeError::InviterNotMember { .. })
    ));

    let creator = open.creator_id().clone();
    let invitee = UserId::random();
    open.invite(&creator, &invitee, at(2)).expect("invite");
    assert_eq!(
        open.invite(&creator, &invitee, at(3)),
        Err(ChallengeError::AlreadyInvited {
            user_id: invitee.clone()
        })
    );
    assert_eq!(open.invitations()[0].status, InvitationStatus::Pending);
}

#[rstest]
fn participants_may_invite_but_not_reinvite_members(mut pending: Challenge) {
    let member = UserId::random();
    let other = UserId::random();
    pending.join(&member, at(0)).expect("join");
    pending.join(&other, at(1)).expect("join");

    assert!(matches!(
        pending.invite(&member, &other, at(2)),
        Err(ChallengeError::AlreadyJoined { .. })
    ));
    pending
        .invite(&member, &UserId::random(), at(3))
        .expect("participant invite");
}

#[rstest]
fn accepting_an_invitation_admits_the_user() {
    let mut input = draft(3, ChallengeUnit::Points);
    input.settings.is_public = false;
    let mut challenge =
        Challenge::create(ChallengeId::random(), UserId::random(), input, at(0)).expect("valid");
    challenge.publish(at(0)).expect("publish");
    let creator = challenge.creator_id().clone();
    let invitee = UserId::random();
    challenge.invite(&creator, &invitee, at(1)).expect("invite");

    challenge
        .respond_to_invitation(&invitee, InvitationResponse::Accept, at(2))
        .expect("accept");

    assert!(challenge.participant(&invitee).is_some());
    let invitation = &challenge.invitations()[0];
    assert_eq!(invitation.status, InvitationStatus::Accepted);
    assert_eq!(invitation.responded_at, Some(at(2)));
    assert_eq!(
        challenge.respond_to_invitation(&invitee, InvitationResponse::Decline, at(3)),
        Err(ChallengeError::InvitationAlreadyResolved { user_id: invitee })
    );
}

#[rstest]
fn declining_is_terminal_and_missing_invitations_are_not_found(mut pending: Challenge) {
    let creator = pending.creator_id().clone();
    let invitee = UserId::random();
    pending.invite(&creator, &invitee, at(1)).expect("invite");
    pending
        .respond_to_invitation(&invitee, InvitationResponse::Decline, at(2))
        .expect("decline");
    assert!(pending.participant(&invitee).is_none());
    assert_eq!(pending.invitations()[0].status, InvitationStatus::Declined);

    let stranger = UserId::random();
    assert_eq!(
        pending.respond_to_invitation(&stranger, InvitationResponse::Accept, at(3)),
        Err(ChallengeError::InvitationNotFound { user_id: stranger })
    );
}

#[rstest]
fn accepting_into_a_full_challenge_keeps_invitation_pending() {
    let mut challenge = build(1, ChallengeUnit::Points);
    challenge.publish(at(0)).expect("publish");
    let creator = challenge.creator_id().clone();
    let invitee = UserId::random();
    challenge.invite(&creator, &invitee, at(1)).expect("invite");
    challenge.join(&UserId::random(), at(2)).expect("join");

    assert_eq!(
        challenge.respond_to_invitation(&invitee, InvitationResponse::Accept, at(3)),
        Err(ChallengeError::ChallengeFull { max_participants: 1 })
    );
    assert_eq!(challenge.invitations()[0].status, InvitationStatus::Pending);
    assert_eq!(challenge.participants().len(), 1);
}

#[rstest]
fn complete_distributes_rewards_by_rank(mut active: Challenge) {
    let members = users(3);
    for (offset, user) in members.iter().enumerate() {
        active.join(user, at(offset as i64)).expect("join");
    }
    active.update_progress(&members[1], 80.0, at(10)).expect("update");
    active.update_progress(&members[2], 20.0, at(11)).expect("update");

    let grants = active.complete(at(20)).expect("complete").to_vec();

    assert_eq!(grants.len(), 3);
    assert_eq!(grants[0].user_id, members[1]);
    assert_eq!((grants[0].rank, grants[0].xp), (1, 300));
    assert_eq!(grants[0].badge.as_deref(), Some("gold"));
    assert_eq!(grants[0].title.as_deref(), Some("Champion"));
    assert_eq!((grants[1].rank, grants[1].xp), (2, 200));
    assert_eq!((grants[2].rank, grants[2].xp), (3, 100));
    assert_eq!(active.reward_grants(), grants.as_slice());
}

#[rstest]
fn ranks_beyond_third_earn_participation() {
    let table = draft(5, ChallengeUnit::Points).rewards;
    assert_eq!(table.for_rank(4).xp, 25);
    assert_eq!(table.for_rank(40).xp, 25);
}

fn contribution(ended_at: DateTime<Utc>) -> SessionContribution {
    SessionContribution {
        session_id: SessionId::random(),
        ended_at,
        minutes: 25,
        xp: 5,
        streak: 4,
    }
}

#[rstest]
#[case(ChallengeUnit::Minutes, 25.0)]
#[case(ChallengeUnit::Sessions, 1.0)]
#[case(ChallengeUnit::Days, 4.0)]
#[case(ChallengeUnit::Xp, 5.0)]
fn sessions_feed_progress_by_unit(#[case] unit: ChallengeUnit, #[case] expected: f64) {
    let mut challenge = build(3, unit);
    challenge.publish(at(0)).expect("publish");
    challenge.start(at(0)).expect("start");
    let user = UserId::random();
    challenge.join(&user, at(1)).expect("join");

    let changed = challenge
        .record_session(&user, &contribution(at(30)), at(31))
        .expect("record");

    assert!(changed);
    let participant = challenge.participant(&user).expect("participant");
    assert!((participant.progress - expected).abs() < f64::EPSILON);
}

#[rstest]
fn sessions_count_once_and_only_inside_the_window() {
    let mut challenge = build(3, ChallengeUnit::Minutes);
    challenge.publish(at(0)).expect("publish");
    challenge.start(at(0)).expect("start");
    let user = UserId::random();
    challenge.join(&user, at(1)).expect("join");

    let inside = contribution(at(30));
    assert!(challenge.record_session(&user, &inside, at(31)).expect("first"));
    assert!(!challenge.record_session(&user, &inside, at(32)).expect("replay"));
    let outside = contribution(at(-5));
    assert!(!challenge.record_session(&user, &outside, at(33)).expect("early"));

    let participant = challenge.participant(&user).expect("participant");
    assert!((participant.progress - 25.0).abs() < f64::EPSILON);
}

#[rstest]
fn points_challenges_ignore_sessions(mut active: Challenge) {
    let user = UserId::random();
    active.join(&user, at(1)).expect("join");
    assert!(!active.record_session(&user, &contribution(at(30)), at(31)).expect("record"));
}

#[rstest]
fn session_progress_requires_membership() {
    let mut challenge = build(3, ChallengeUnit::Minutes);
    challenge.publish(at(0)).expect("publish");
    challenge.start(at(0)).expect("start");
    assert!(matches!(
        challenge.record_session(&UserId::random(), &contribution(at(30)), at(31)),
        Err(ChallengeError::NotParticipant { .. })
    ));
}

#[rstest]
#[case(ChallengeError::ChallengeFull { max_participants: 2 }, ErrorCode::Conflict, "challenge_full")]
#[case(ChallengeError::AlreadyJoined { user_id: UserId::random() }, ErrorCode::Conflict, "already_joined")]
#[case(ChallengeError::NotParticipant { user_id: UserId::random() }, ErrorCode::NotFound, "not_participant")]
#[case(ChallengeError::InvitesDisabled, ErrorCode::Forbidden, "invites_disabled")]
#[case(ChallengeError::InvalidProgress { value: -1.0 }, ErrorCode::InvalidRequest, "invalid_progress")]
#[case(
    ChallengeError::InvalidTransition { action: ChallengeAction::Start, status: ChallengeStatus::Draft },
    ErrorCode::InvalidTransition,
    "invalid_transition"
)]
fn challenge_errors_map_to_domain_codes(
    #[case] error: ChallengeError,
    #[case] code: ErrorCode,
    #[case] reason: &str,
) {
    let mapped = crate::domain::Error::from(error);
    assert_eq!(mapped.code(), code);
    assert_eq!(mapped.reason(), Some(reason));
}
