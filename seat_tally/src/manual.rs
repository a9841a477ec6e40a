/*!

This is the long-form manual for `seat_tally` and `ballotbox`.

## Counting rules

The count runs in rounds. In each round:

1. Every candidate that is neither elected nor eliminated starts at zero votes,
   in the order the candidates were registered.
2. Every ballot gives one vote to its highest ranked candidate that is still
   active. A ballot whose candidates are all elected or eliminated is
   *exhausted*: it counts for nobody in this round and in the following ones.
3. The candidate with the most votes is elected. If several candidates share
   the highest count, the one registered first is elected.
4. The candidate with the fewest votes is eliminated. If several candidates
   share the lowest count, the one registered first is eliminated.

The count stops once all the seats are filled, or when every candidate has
been elected or eliminated. If there are fewer candidates than seats, fewer
winners are returned; this is not an error.

There is no quota: a candidate does not need a minimum number of votes to be
elected, and votes are never weighted or transferred as a surplus.

### Picking the same candidate twice

The elected and the eliminated candidate are picked independently. When only
one candidate is left, or when all the remaining candidates have the same
count, the same candidate is both elected and eliminated in that round. It
then appears in both the list of winners and the list of eliminated
candidates.

## Ballots

A ballot must rank exactly the configured number of candidates (14 by
default), every entry must be a registered candidate and no candidate may
appear twice. Ballots that break one of these rules are refused with one of
the reasons `WrongLength`, `UnknownCandidate` or `DuplicateCandidate`.

## Output

The `ballotbox results --mode counted` command prints the rounds with, for
each round, the elected candidate, the eliminated candidate, the tally of the
active candidates and the number of exhausted ballots:

```text
{
  "method": "elect-top-eliminate-bottom",
  "seats": 1,
  "quota": null,
  "totalBallots": 3,
  "winners": ["X"],
  "rounds": [
    {
      "round": 1,
      "elected": ["X"],
      "eliminated": ["Z"],
      "tallies": { "X": 2, "Y": 1, "Z": 0 },
      "exhausted": 0
    }
  ]
}
```

*/
